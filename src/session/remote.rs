//! Sessions over a byte stream: [`serve`] runs a session for one connection,
//! [`RemoteSession`] talks to it.

use std::io::{BufReader, BufWriter, Read, Write};

use super::protocol::{Reply, Request, read_message, write_message};
use super::{CtxFlags, Response, Session};
use crate::error::{Error, RC_INVALID_FORMAT, Result};

/// Serve `session` to one peer until it disconnects or the session quits.
pub fn serve<S, R, W>(session: &mut S, reader: R, writer: W) -> Result<()>
where
    S: Session + ?Sized,
    R: Read,
    W: Write,
{
    let mut reader = BufReader::new(reader);
    let mut writer = BufWriter::new(writer);

    loop {
        let request: Request = match read_message(&mut reader) {
            Ok(req) => req,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                // Peer disconnected
                break;
            }
            Err(e) => {
                log::warn!("invalid request: {}", e);
                let reply = Reply::Error {
                    code: RC_INVALID_FORMAT,
                    message: format!("invalid request: {}", e),
                };
                write_message(&mut writer, &reply)?;
                continue;
            }
        };

        let reply = handle_request(session, request);
        write_message(&mut writer, &reply)?;

        if let Reply::Value(response) = &reply
            && response.flags.is_quit()
        {
            log::debug!("session quit, closing connection");
            break;
        }
    }

    Ok(())
}

fn handle_request<S: Session + ?Sized>(session: &mut S, request: Request) -> Reply {
    let result = match request {
        Request::Send { fragment, flags } => session
            .send(&fragment, flags)
            .map(|ready| Reply::Sent { ready }),
        Request::Recv => session.recv().map(Reply::Value),
    };
    result.unwrap_or_else(|e| Reply::Error {
        code: e.code(),
        message: e.to_string(),
    })
}

/// Client end of [`serve`].
pub struct RemoteSession<R: Read, W: Write> {
    reader: BufReader<R>,
    writer: BufWriter<W>,
}

impl<R: Read, W: Write> RemoteSession<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
        }
    }

    fn request(&mut self, request: &Request) -> Result<Reply> {
        write_message(&mut self.writer, request)?;
        match read_message(&mut self.reader)? {
            Reply::Error { code, message } => Err(Error::from_code(code, message)),
            reply => Ok(reply),
        }
    }
}

impl<R: Read, W: Write> Session for RemoteSession<R, W> {
    fn send(&mut self, fragment: &str, flags: CtxFlags) -> Result<bool> {
        let request = Request::Send {
            fragment: fragment.to_string(),
            flags,
        };
        match self.request(&request)? {
            Reply::Sent { ready } => Ok(ready),
            other => Err(Error::protocol(format!("unexpected reply to send: {:?}", other))),
        }
    }

    fn recv(&mut self) -> Result<Response> {
        match self.request(&Request::Recv)? {
            Reply::Value(response) => Ok(response),
            other => Err(Error::protocol(format!("unexpected reply to recv: {:?}", other))),
        }
    }
}

#[cfg(unix)]
mod unix {
    use std::os::unix::net::UnixStream;
    use std::path::Path;
    use std::time::Duration;

    use super::RemoteSession;
    use crate::error::Result;

    /// Read/write timeout
    const IO_TIMEOUT: Duration = Duration::from_secs(30);

    impl RemoteSession<UnixStream, UnixStream> {
        /// Connect to a server listening on a Unix socket.
        pub fn connect(path: &Path) -> Result<Self> {
            let stream = UnixStream::connect(path)?;
            stream.set_read_timeout(Some(IO_TIMEOUT))?;
            stream.set_write_timeout(Some(IO_TIMEOUT))?;
            Ok(Self::new(stream.try_clone()?, stream))
        }
    }
}
