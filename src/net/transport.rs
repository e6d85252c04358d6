//! Transport primitives for the collector connection.

use std::{
    io::{self, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use native_tls::{TlsConnector, TlsStream};

/// Collector endpoint targeted by the shipper.
#[derive(Clone, Debug)]
pub struct Endpoint {
    /// Hostname or IP address to connect to.
    pub host: String,
    /// TCP port number.
    pub port: u16,
    /// TLS options; `None` ships over plaintext TCP.
    pub tls: Option<TlsOptions>,
}

impl Endpoint {
    fn socket_addrs(&self) -> io::Result<Vec<SocketAddr>> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map(|iter| iter.collect())
    }
}

/// TLS connection options.
#[derive(Clone, Debug)]
pub struct TlsOptions {
    /// Domain name presented during the TLS handshake.
    pub domain: String,
    /// Skip certificate validation when true (intended for tests).
    pub accept_invalid_certs: bool,
}

impl TlsOptions {
    fn connector(&self) -> io::Result<TlsConnector> {
        let mut builder = TlsConnector::builder();
        if self.accept_invalid_certs {
            builder.danger_accept_invalid_certs(true);
            builder.danger_accept_invalid_hostnames(true);
        }
        builder.build().map_err(io::Error::other)
    }
}

/// Duplex byte stream bound to one connected socket.
pub enum ActiveConnection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl ActiveConnection {
    /// Update the write timeout for the underlying socket.
    pub(crate) fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            ActiveConnection::Plain(stream) => stream.set_write_timeout(timeout),
            ActiveConnection::Tls(stream) => stream.get_ref().set_write_timeout(timeout),
        }
    }

    /// Write a full record line to the socket.
    pub(crate) fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            ActiveConnection::Plain(stream) => stream.write_all(buf),
            ActiveConnection::Tls(stream) => stream.write_all(buf),
        }
    }

    /// Flush the underlying writer.
    pub(crate) fn flush(&mut self) -> io::Result<()> {
        match self {
            ActiveConnection::Plain(stream) => stream.flush(),
            ActiveConnection::Tls(stream) => stream.flush(),
        }
    }
}

fn connect_tcp(endpoint: &Endpoint, timeout: Duration) -> io::Result<TcpStream> {
    let addrs = endpoint.socket_addrs()?;
    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no addresses resolved for {}:{}", endpoint.host, endpoint.port),
        )
    }))
}

/// Establish a connection to `endpoint`, wrapping it in TLS when
/// configured. The TLS handshake runs under the connect timeout so a
/// stalled peer cannot hold the worker indefinitely; certificate
/// validation failures surface as ordinary connect errors.
pub(crate) fn connect(endpoint: &Endpoint, connect_timeout: Duration) -> io::Result<ActiveConnection> {
    let stream = connect_tcp(endpoint, connect_timeout)?;
    let Some(tls) = &endpoint.tls else {
        return Ok(ActiveConnection::Plain(stream));
    };

    let connector = tls.connector()?;
    stream.set_read_timeout(Some(connect_timeout))?;
    stream.set_write_timeout(Some(connect_timeout))?;
    let stream = connector
        .connect(&tls.domain, stream)
        .map_err(io::Error::other)?;
    let tcp = stream.get_ref();
    tcp.set_read_timeout(None)?;
    tcp.set_write_timeout(None)?;
    Ok(ActiveConnection::Tls(Box::new(stream)))
}
