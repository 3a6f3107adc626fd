use std::io::{ErrorKind, Read, Write};
use std::net::Shutdown;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info, trace};

use crate::config::CommunicatorConfig;
use crate::error::{Result, TransportError};
use crate::traits::{ChunkSource, Communicator};

// sun_path capacity, including the trailing NUL.
#[cfg(target_os = "linux")]
const MAX_PATH_LEN: usize = 108;
#[cfg(not(target_os = "linux"))]
const MAX_PATH_LEN: usize = 104;

fn check_path_len(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_PATH_LEN {
        return Err(TransportError::PathTooLong {
            path: path.to_path_buf(),
            len,
            max: MAX_PATH_LEN,
        });
    }
    Ok(())
}

/// Communicator over a Unix domain socket.
///
/// Serial bridges (for example `socat` exposing a USB-serial Tappy) and
/// device emulators listen on a socket path; this communicator connects to
/// it and moves raw frame bytes.
#[derive(Debug)]
pub struct UnixSocketCommunicator {
    path: Option<PathBuf>,
    stream: Option<UnixStream>,
    config: CommunicatorConfig,
}

impl UnixSocketCommunicator {
    /// Create a disconnected communicator for a socket path.
    pub fn new(path: impl AsRef<Path>, config: CommunicatorConfig) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            stream: None,
            config,
        }
    }

    /// Wrap an already-connected stream, such as one returned by
    /// [`UnixSocketListener::accept`].
    ///
    /// A communicator built this way has no path, so it cannot reconnect
    /// after `disconnect`.
    pub fn from_stream(stream: UnixStream, config: CommunicatorConfig) -> Result<Self> {
        apply_timeouts(&stream, &config)?;
        Ok(Self {
            path: None,
            stream: Some(stream),
            config,
        })
    }

    /// The socket path, if this communicator dials one.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current configuration.
    pub fn config(&self) -> &CommunicatorConfig {
        &self.config
    }

    fn stream_mut(&mut self) -> Result<&mut UnixStream> {
        self.stream.as_mut().ok_or(TransportError::NotConnected)
    }
}

fn apply_timeouts(stream: &UnixStream, config: &CommunicatorConfig) -> Result<()> {
    stream.set_read_timeout(config.read_timeout)?;
    stream.set_write_timeout(config.write_timeout)?;
    Ok(())
}

impl Communicator for UnixSocketCommunicator {
    fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }
        let path = self.path.clone().ok_or(TransportError::NotConnected)?;
        check_path_len(&path)?;

        let stream = UnixStream::connect(&path).map_err(|source| TransportError::Connect {
            path: path.clone(),
            source,
        })?;
        apply_timeouts(&stream, &self.config)?;
        debug!(?path, "connected to device socket");
        self.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotConnected => {}
                Err(err) => return Err(TransportError::Io(err)),
            }
            debug!(path = ?self.path, "disconnected from unix domain socket");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let timeout = self.config.write_timeout.unwrap_or_default();
        let stream = self.stream_mut()?;
        let mut offset = 0usize;
        while offset < bytes.len() {
            match stream.write(&bytes[offset..]) {
                Ok(0) => {
                    self.stream = None;
                    return Err(TransportError::ConnectionClosed);
                }
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                // A blocking socket with a write timeout reports expiry as
                // WouldBlock on Unix.
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    debug!(written = offset, len = bytes.len(), "write to device timed out");
                    return Err(TransportError::WriteTimeout(timeout));
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
        trace!(len = bytes.len(), "wrote bytes to unix domain socket");
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        let stream = self.stream_mut()?;
        loop {
            match stream.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl ChunkSource for UnixSocketCommunicator {
    fn read_chunk(&mut self) -> Result<Option<Bytes>> {
        let chunk_size = self.config.read_chunk_size.max(1);
        let stream = self.stream_mut()?;
        let mut chunk = vec![0u8; chunk_size];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => {
                    self.stream = None;
                    debug!(path = ?self.path, "peer closed unix domain socket");
                    return Err(TransportError::ConnectionClosed);
                }
                Err(err) if err.kind() == ErrorKind::ConnectionReset => {
                    self.stream = None;
                    debug!(path = ?self.path, "unix domain socket reset by peer");
                    return Err(TransportError::ConnectionClosed);
                }
                Ok(n) => {
                    chunk.truncate(n);
                    trace!(len = n, "read chunk from unix domain socket");
                    return Ok(Some(Bytes::from(chunk)));
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut =>
                {
                    return Ok(None)
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl Drop for UnixSocketCommunicator {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

/// Listening side of a Unix domain socket.
///
/// Used by device emulators and by the `tappy listen` monitor. The socket
/// file is created with owner-only permissions and removed on drop, unless
/// the path was replaced while the listener was alive.
pub struct UnixSocketListener {
    listener: UnixListener,
    path: PathBuf,
    /// `(dev, ino)` of the socket file created by `bind`.
    identity: (u64, u64),
}

const SOCKET_MODE: u32 = 0o600;

impl UnixSocketListener {
    /// Bind a socket at `path` with owner-only permissions.
    ///
    /// A leftover socket from an earlier run is replaced. Any other kind of
    /// file at `path` is left alone and reported as a bind error.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        check_path_len(&path)?;

        let bind_err = |source: std::io::Error| TransportError::Bind {
            path: path.clone(),
            source,
        };

        match std::fs::symlink_metadata(&path) {
            Ok(existing) if existing.file_type().is_socket() => {
                debug!(?path, "replacing leftover device socket");
                std::fs::remove_file(&path).map_err(bind_err)?;
            }
            Ok(_) => {
                return Err(bind_err(std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    "path exists and is not a socket",
                )))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(bind_err(err)),
        }

        let listener = UnixListener::bind(&path).map_err(bind_err)?;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(SOCKET_MODE))
            .map_err(bind_err)?;
        let created = std::fs::symlink_metadata(&path).map_err(bind_err)?;

        info!(?path, "device socket ready");
        Ok(Self {
            listener,
            identity: (created.dev(), created.ino()),
            path,
        })
    }

    /// Block until a host connects.
    pub fn accept(&self) -> Result<UnixStream> {
        let (stream, _) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(path = ?self.path, "host connected");
        Ok(stream)
    }

    /// Block until a host connects and wrap the stream as a communicator.
    pub fn accept_communicator(&self, config: CommunicatorConfig) -> Result<UnixSocketCommunicator> {
        UnixSocketCommunicator::from_stream(self.accept()?, config)
    }

    /// Accept a pending host connection without blocking.
    ///
    /// Returns `Ok(None)` when no host is waiting, so callers can poll
    /// between checks of a shutdown flag. The accepted stream is switched
    /// back to blocking mode before the timeouts from `config` apply.
    pub fn try_accept_communicator(
        &self,
        config: CommunicatorConfig,
    ) -> Result<Option<UnixSocketCommunicator>> {
        self.listener
            .set_nonblocking(true)
            .map_err(TransportError::Accept)?;
        let accepted = self.listener.accept();
        self.listener
            .set_nonblocking(false)
            .map_err(TransportError::Accept)?;

        match accepted {
            Ok((stream, _)) => {
                stream.set_nonblocking(false)?;
                debug!(path = ?self.path, "host connected");
                UnixSocketCommunicator::from_stream(stream, config).map(Some)
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnixSocketListener {
    fn drop(&mut self) {
        // Only remove the file this listener created.
        let ours = std::fs::symlink_metadata(&self.path).is_ok_and(|meta| {
            meta.file_type().is_socket() && (meta.dev(), meta.ino()) == self.identity
        });
        if ours {
            let _ = std::fs::remove_file(&self.path);
        } else {
            debug!(path = ?self.path, "socket path was replaced, leaving it in place");
        }
    }
}
