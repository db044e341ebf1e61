//! Connection lifecycle dengan blocking I/O.
//!
//! Satu `Connection` = satu logical link: paling banyak satu listening
//! handle dan satu peer link aktif. Semua operasi blocking; varian
//! `*_timeout` memberi bounded wait tanpa mengubah kontrak single-peer.
//!
//! Tidak ada lock internal - struct ini memang bukan `Sync`-by-contract,
//! satu thread per connection.

use std::io::{self, Write};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use crate::core::RecvBuffer;
use crate::error::{Result, TransportError};
use crate::protocol;

/// Listen backlog. Transport ini single-peer: koneksi kedua yang datang
/// saat satu peer sudah diterima dibiarkan antre/ditolak oleh OS.
#[cfg(unix)]
const BACKLOG: libc::c_int = 1;

/// Polling interval untuk bounded accept.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Posisi connection dalam lifecycle.
///
/// `Closed` terminal; untuk mulai lagi, buat `Connection` baru.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Buffer sudah dialokasikan, belum ada handle terbuka.
    Started,
    /// Terhubung sebagai client.
    Client,
    /// Listening handle terbuka, belum ada peer.
    Listening,
    /// Peer diterima lewat listener.
    Accepted,
    /// Semua handle dan buffer sudah dilepas.
    Closed,
}

/// Satu point-to-point link dengan framing ber-checksum.
///
/// Memiliki listening handle dan peer handle (masing-masing opsional),
/// plus receive buffer dan encode buffer yang di-reuse antar frame.
#[derive(Debug)]
pub struct Connection {
    listener: Option<TcpListener>,
    peer: Option<TcpStream>,
    recv_buf: RecvBuffer,
    send_buf: Vec<u8>,
    state: State,
}

impl Connection {
    /// Buat connection baru dan alokasikan receive buffer-nya.
    pub fn new() -> Result<Self> {
        Ok(Self {
            listener: None,
            peer: None,
            recv_buf: RecvBuffer::new()?,
            send_buf: Vec::new(),
            state: State::Started,
        })
    }

    /// Connect ke `host:port` sebagai client.
    ///
    /// `host` harus alamat IPv4 numerik (tidak ada hostname resolution).
    /// Peer link lama (kalau ada) ditutup dulu.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.ensure_open()?;
        let ip = parse_host(host)?;

        // Tutup link lama sebelum buka yang baru.
        self.peer.take();

        let stream = TcpStream::connect(SocketAddrV4::new(ip, port))
            .map_err(TransportError::Connect)?;
        configure_stream(&stream).map_err(TransportError::Connect)?;

        log::debug!("connected to {}:{}", ip, port);
        self.peer = Some(stream);
        self.state = State::Client;
        Ok(())
    }

    /// Buka listening handle di `host:port` dengan backlog satu.
    ///
    /// Port 0 valid; alamat hasil bind bisa dibaca lewat [`local_addr`].
    ///
    /// [`local_addr`]: Connection::local_addr
    pub fn listen(&mut self, host: &str, port: u16) -> Result<()> {
        self.ensure_open()?;
        let ip = parse_host(host)?;

        let listener = bind_listener(SocketAddrV4::new(ip, port))?;
        log::debug!(
            "listening on {}",
            listener
                .local_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| format!("{}:{}", ip, port))
        );
        self.listener = Some(listener);
        self.state = State::Listening;
        Ok(())
    }

    /// Block sampai satu peer connect, return alamat peer tersebut.
    ///
    /// Peer yang diterima sebelumnya ditutup sebelum menunggu yang baru,
    /// jadi accept berurutan di listener yang sama tidak membocorkan
    /// handle.
    pub fn accept(&mut self) -> Result<SocketAddr> {
        self.ensure_open()?;
        let listener = self.listener.as_ref().ok_or(TransportError::NotListening)?;

        self.peer.take();

        let (stream, peer_addr) = listener.accept().map_err(TransportError::Accept)?;
        configure_stream(&stream).map_err(TransportError::Accept)?;

        log::debug!("accepted peer {}", peer_addr);
        self.peer = Some(stream);
        self.state = State::Accepted;
        Ok(peer_addr)
    }

    /// Seperti [`accept`], tapi menyerah dengan [`TransportError::Timeout`]
    /// kalau tidak ada peer dalam `timeout`.
    ///
    /// [`accept`]: Connection::accept
    pub fn accept_timeout(&mut self, timeout: Duration) -> Result<SocketAddr> {
        self.ensure_open()?;
        let listener = self.listener.as_ref().ok_or(TransportError::NotListening)?;

        self.peer.take();

        listener.set_nonblocking(true).map_err(TransportError::Accept)?;
        let deadline = Instant::now() + timeout;
        let accepted = loop {
            match listener.accept() {
                Ok(pair) => break Ok(pair),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        break Err(TransportError::Timeout);
                    }
                    std::thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => break Err(TransportError::Accept(e)),
            }
        };
        // Kembalikan listener ke blocking apa pun hasilnya.
        let restored = listener.set_nonblocking(false);

        let (stream, peer_addr) = accepted?;
        restored.map_err(TransportError::Accept)?;
        configure_stream(&stream).map_err(TransportError::Accept)?;

        log::debug!("accepted peer {} (bounded wait)", peer_addr);
        self.peer = Some(stream);
        self.state = State::Accepted;
        Ok(peer_addr)
    }

    /// Kirim satu frame berisi `payload` ke peer aktif.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        let stream = self.peer.as_mut().ok_or(TransportError::NotConnected)?;

        protocol::encode_into(&mut self.send_buf, payload)?;
        stream
            .write_all(&self.send_buf)
            .map_err(TransportError::Send)?;

        log::trace!("sent frame ({} payload bytes)", payload.len());
        Ok(())
    }

    /// Terima satu frame dari peer aktif, return payload-nya.
    ///
    /// Slice yang dikembalikan menunjuk ke receive buffer internal dan
    /// valid sampai receive berikutnya.
    pub fn recv(&mut self) -> Result<&[u8]> {
        self.ensure_open()?;
        let stream = self.peer.as_mut().ok_or(TransportError::NotConnected)?;

        let len = protocol::decode_from(stream, &mut self.recv_buf)?;
        log::trace!("received frame ({} payload bytes)", len);
        Ok(&self.recv_buf.filled()[..len])
    }

    /// Seperti [`recv`], tapi menyerah dengan [`TransportError::Timeout`]
    /// kalau tidak ada data dalam `timeout`.
    ///
    /// Timeout di tengah frame meninggalkan stream dalam keadaan
    /// desynchronized - setelah itu caller diharapkan [`close`].
    ///
    /// [`recv`]: Connection::recv
    /// [`close`]: Connection::close
    pub fn recv_timeout(&mut self, timeout: Duration) -> Result<&[u8]> {
        self.ensure_open()?;
        let stream = self.peer.as_mut().ok_or(TransportError::NotConnected)?;

        stream
            .set_read_timeout(Some(timeout))
            .map_err(TransportError::Receive)?;
        let decoded = protocol::decode_from(stream, &mut self.recv_buf);
        let restored = stream.set_read_timeout(None);

        let len = match decoded {
            // SO_RCVTIMEO muncul sebagai WouldBlock di Unix, TimedOut di
            // Windows.
            Err(TransportError::Receive(ref e))
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) =>
            {
                return Err(TransportError::Timeout)
            }
            other => other?,
        };
        restored.map_err(TransportError::Receive)?;

        log::trace!("received frame ({} payload bytes, bounded wait)", len);
        Ok(&self.recv_buf.filled()[..len])
    }

    /// Lepas semua resource: peer link, listener, dan buffer.
    ///
    /// Best-effort - setiap handle tetap dilepas walau step sebelumnya
    /// gagal; failure pertama dilaporkan setelah teardown selesai.
    /// Aman dipanggil dari state mana pun, termasuk dua kali.
    pub fn close(&mut self) -> Result<()> {
        let mut first_err: Option<io::Error> = None;

        if let Some(peer) = self.peer.take() {
            match peer.shutdown(Shutdown::Both) {
                Ok(()) => {}
                // Peer sudah menutup duluan - bukan failure.
                Err(ref e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => first_err = Some(e),
            }
        }
        self.listener.take();
        self.recv_buf.release();
        self.send_buf = Vec::new();
        self.state = State::Closed;

        log::debug!("connection closed");
        match first_err {
            Some(e) => Err(TransportError::Close(e)),
            None => Ok(()),
        }
    }

    /// State lifecycle saat ini.
    #[inline(always)]
    pub fn state(&self) -> State {
        self.state
    }

    /// Alamat listening handle, kalau sedang listen.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Alamat peer aktif, kalau ada.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer.as_ref().and_then(|p| p.peer_addr().ok())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == State::Closed {
            return Err(TransportError::InvalidState);
        }
        Ok(())
    }
}

fn parse_host(host: &str) -> Result<Ipv4Addr> {
    host.parse::<Ipv4Addr>()
        .map_err(|_| TransportError::AddressInvalid(host.to_string()))
}

/// Setup yang sama untuk stream hasil connect maupun accept.
fn configure_stream(stream: &TcpStream) -> io::Result<()> {
    // CRITICAL: TCP_NODELAY, frame kecil tidak boleh menunggu Nagle.
    stream.set_nodelay(true)?;
    // Socket hasil accept bisa mewarisi non-blocking dari listener.
    stream.set_nonblocking(false)?;
    tune_socket_buffers(stream);
    Ok(())
}

/// Besarkan socket buffer untuk throughput.
/// Ignore errors - not all platforms support this.
#[cfg(unix)]
fn tune_socket_buffers(stream: &TcpStream) {
    use std::os::unix::io::AsRawFd;
    let fd = stream.as_raw_fd();
    unsafe {
        let optval: libc::c_int = 256 * 1024; // 256KB
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            &optval as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
}

#[cfg(not(unix))]
fn tune_socket_buffers(_stream: &TcpStream) {}

/// Listener dengan backlog persis satu.
///
/// Lewat `socket(2)`/`bind(2)`/`listen(2)` langsung supaya backlog bisa
/// diset dan tiap tahap punya error kind sendiri.
#[cfg(unix)]
fn bind_listener(addr: SocketAddrV4) -> Result<TcpListener> {
    use std::os::unix::io::FromRawFd;

    unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_STREAM, 0);
        if fd < 0 {
            return Err(TransportError::SocketCreate(io::Error::last_os_error()));
        }

        // Supaya rebind cepat setelah close; error diabaikan.
        let one: libc::c_int = 1;
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_REUSEADDR,
            &one as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );

        let mut sin: libc::sockaddr_in = std::mem::zeroed();
        sin.sin_family = libc::AF_INET as libc::sa_family_t;
        sin.sin_port = addr.port().to_be();
        sin.sin_addr = libc::in_addr {
            s_addr: u32::from_ne_bytes(addr.ip().octets()),
        };

        if libc::bind(
            fd,
            &sin as *const _ as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
        ) < 0
        {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(TransportError::Bind(err));
        }

        if libc::listen(fd, BACKLOG) < 0 {
            let err = io::Error::last_os_error();
            libc::close(fd);
            return Err(TransportError::Listen(err));
        }

        Ok(TcpListener::from_raw_fd(fd))
    }
}

/// Fallback portabel: backlog mengikuti default platform, kontrak
/// single-peer tetap sama.
#[cfg(not(unix))]
fn bind_listener(addr: SocketAddrV4) -> Result<TcpListener> {
    TcpListener::bind(addr).map_err(TransportError::Bind)
}
