//! Iris Echo - Demo Binary
//!
//! Latihan end-to-end untuk transport: satu proses jadi echo server,
//! proses lain jadi client yang mengukur round-trip latency per frame.
//!
//! Usage:
//!   cargo run --release --bin iris_echo -- --listen 127.0.0.1:9999
//!   cargo run --release --bin iris_echo -- --connect 127.0.0.1:9999 --count 1000 --size 64

use std::time::Instant;

use iris::{Connection, TransportError};

struct EchoConfig {
    listen: Option<String>,
    connect: Option<String>,
    count: u32,
    size: usize,
    verbose: bool,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            listen: None,
            connect: None,
            count: 1000,
            size: 64,
            verbose: false,
        }
    }
}

fn split_endpoint(endpoint: &str) -> Option<(&str, u16)> {
    let (host, port) = endpoint.rsplit_once(':')?;
    Some((host, port.parse().ok()?))
}

/// Echo server: terima peer satu per satu, pantulkan setiap frame.
fn run_server(endpoint: &str) -> Result<(), TransportError> {
    let (host, port) =
        split_endpoint(endpoint).ok_or_else(|| TransportError::AddressInvalid(endpoint.into()))?;

    let mut conn = Connection::new()?;
    conn.listen(host, port)?;
    println!("🔌 Echo server listening on {}", endpoint);

    loop {
        let peer = conn.accept()?;
        println!("✅ Peer connected: {}", peer);

        let mut frames = 0u64;
        loop {
            let payload = match conn.recv() {
                Ok(p) => p.to_vec(),
                Err(TransportError::ConnectionClosed { .. }) => break,
                Err(e) => return Err(e),
            };
            conn.send(&payload)?;
            frames += 1;
        }
        println!("❌ Peer {} disconnected after {} frames", peer, frames);
    }
}

/// Client: kirim frame, tunggu echo, ukur round trip.
fn run_client(endpoint: &str, config: &EchoConfig) -> Result<(), TransportError> {
    let (host, port) =
        split_endpoint(endpoint).ok_or_else(|| TransportError::AddressInvalid(endpoint.into()))?;

    let mut conn = Connection::new()?;
    conn.connect(host, port)?;
    println!("🔌 Connected to {} (TCP_NODELAY=true)", endpoint);
    println!(
        "📡 Sending {} frames of {} bytes...\n",
        config.count, config.size
    );

    let payload: Vec<u8> = (0..config.size).map(|i| (i % 256) as u8).collect();
    let mut latencies_ns = Vec::with_capacity(config.count as usize);

    for i in 0..config.count {
        let start = Instant::now();
        conn.send(&payload)?;
        let echoed = conn.recv()?;
        let rtt = start.elapsed();

        assert_eq!(echoed, &payload[..], "echo mismatch at frame {}", i);
        latencies_ns.push(rtt.as_nanos() as u64);

        if config.verbose && (i + 1) % 100 == 0 {
            println!("  [{}] RTT: {:.2} μs", i + 1, rtt.as_nanos() as f64 / 1000.0);
        }
    }

    conn.close()?;

    latencies_ns.sort_unstable();
    let min = latencies_ns[0];
    let max = latencies_ns[latencies_ns.len() - 1];
    let avg: u64 = latencies_ns.iter().sum::<u64>() / latencies_ns.len() as u64;
    let p50 = latencies_ns[latencies_ns.len() / 2];
    let p99 = latencies_ns[latencies_ns.len() * 99 / 100];

    println!("\n📊 ECHO RESULTS");
    println!("===============");
    println!("  Frames:    {}", config.count);
    println!("  Payload:   {} bytes", config.size);
    println!("  Min RTT:   {:.2} μs", min as f64 / 1000.0);
    println!("  Max RTT:   {:.2} μs", max as f64 / 1000.0);
    println!("  Avg RTT:   {:.2} μs", avg as f64 / 1000.0);
    println!("  P50 RTT:   {:.2} μs", p50 as f64 / 1000.0);
    println!("  P99 RTT:   {:.2} μs", p99 as f64 / 1000.0);

    Ok(())
}

fn parse_args() -> EchoConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = EchoConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--listen" | "-l" => {
                if i + 1 < args.len() {
                    config.listen = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--connect" | "-c" => {
                if i + 1 < args.len() {
                    config.connect = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--count" | "-n" => {
                if i + 1 < args.len() {
                    config.count = args[i + 1].parse().unwrap_or(1000);
                    i += 1;
                }
            }
            "--size" | "-s" => {
                if i + 1 < args.len() {
                    config.size = args[i + 1].parse().unwrap_or(64);
                    i += 1;
                }
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--help" | "-h" => {
                println!("Iris Echo - framed transport demo\n");
                println!("Usage: iris_echo [OPTIONS]\n");
                println!("Options:");
                println!("  -l, --listen <HOST:PORT>   Run as echo server");
                println!("  -c, --connect <HOST:PORT>  Run as measuring client");
                println!("  -n, --count <N>            Frames to send (default: 1000)");
                println!("  -s, --size <BYTES>         Payload size (default: 64)");
                println!("  -v, --verbose              Verbose output");
                println!("  -h, --help                 Show this help");
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

fn main() {
    env_logger::init();
    let config = parse_args();

    let result = if let Some(endpoint) = config.listen.clone() {
        run_server(&endpoint)
    } else if let Some(endpoint) = config.connect.clone() {
        run_client(&endpoint, &config)
    } else {
        eprintln!("Either --listen or --connect is required (see --help)");
        std::process::exit(2);
    };

    if let Err(e) = result {
        eprintln!("❌ iris_echo error: {}", e);
        std::process::exit(1);
    }
}
