//! Line-oriented front end for a bridge driving the sandbox world.
//!
//! Each TCP client sends one command per line and receives the resulting
//! response as one JSON line. Commands are dispatched between ticks of a
//! fixed-rate simulation loop, so dispatch and step never overlap.

use std::error::Error;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use bridge_core::{Bridge, BridgeConfig, FileSink, SandboxWorld, WorldAccess};
use bridge_runtime::Response;
use crossbeam_channel::{
    bounded, unbounded, Receiver, RecvError, RecvTimeoutError, Sender, TryRecvError,
};
use tracing::{error, info, warn};

/// Steps between metrics log lines.
const METRICS_INTERVAL: u64 = 600;

struct CommandRequest {
    line: String,
    reply: Sender<Response>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = BridgeConfig::from_env()?;
    let sink = FileSink::from_config(&config);
    let mut bridge = Bridge::new(&config, sink)?;
    let mut world = SandboxWorld::with_starter_area();
    let commands = spawn_command_listener(config.command_bind)?;

    info!(
        target: "sim_bridge::server",
        command_bind = %config.command_bind,
        output_dir = %config.output_dir.display(),
        tick_rate_hz = config.tick_rate_hz,
        commands = ?bridge.dispatcher().registry().names(),
        "bridge server ready"
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_flag = running.clone();
    ctrlc::set_handler(move || running_flag.store(false, Ordering::SeqCst))?;

    let tick_interval = Duration::from_secs(1) / config.tick_rate_hz.max(1);
    let mut next_tick = Instant::now() + tick_interval;
    while running.load(Ordering::SeqCst) {
        let served = serve_until(&commands, next_tick, |request| {
            let response = bridge.dispatch(&mut world, &request.line);
            // The client may have hung up; its response stays queued for the artifacts.
            let _ = request.reply.send(response);
        });
        if served.is_err() {
            warn!(target: "sim_bridge::server", "listener.closed");
            break;
        }

        world.advance();
        if let Err(err) = bridge.step(&mut world) {
            error!(target: "sim_bridge::server", error = %err, "step.write_failed");
        }
        next_tick += tick_interval;
        let now = Instant::now();
        if next_tick < now {
            next_tick = now + tick_interval;
        }

        if world.tick() % METRICS_INTERVAL == 0 {
            let metrics = bridge.metrics();
            info!(
                target: "sim_bridge::server",
                tick = world.tick(),
                commands = metrics.commands_dispatched,
                errors = metrics.command_errors,
                events = metrics.events_relayed,
                snapshots = metrics.snapshots_emitted,
                urgent_flushes = metrics.urgent_flushes,
                sink_failures = metrics.sink_failures,
                "metrics"
            );
        }
    }

    info!(target: "sim_bridge::server", tick = world.tick(), "bridge server stopping");
    bridge.shutdown()?;
    Ok(())
}

/// Serves requests until `deadline`. Once the deadline has passed, only the
/// requests already queued at that moment are served, so a client that keeps
/// sending cannot hold off the next tick.
fn serve_until(
    commands: &Receiver<CommandRequest>,
    deadline: Instant,
    mut serve: impl FnMut(CommandRequest),
) -> Result<(), RecvError> {
    while Instant::now() < deadline {
        match commands.recv_deadline(deadline) {
            Ok(request) => serve(request),
            Err(RecvTimeoutError::Timeout) => return Ok(()),
            Err(RecvTimeoutError::Disconnected) => return Err(RecvError),
        }
    }
    for _ in 0..commands.len() {
        match commands.try_recv() {
            Ok(request) => serve(request),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => return Err(RecvError),
        }
    }
    Ok(())
}

fn spawn_command_listener(bind_addr: SocketAddr) -> std::io::Result<Receiver<CommandRequest>> {
    let listener = TcpListener::bind(bind_addr)?;
    listener.set_nonblocking(true)?;

    let (sender, receiver) = unbounded::<CommandRequest>();
    thread::spawn(move || loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                info!(target: "sim_bridge::server", %addr, "client.connected");
                let sender = sender.clone();
                thread::spawn(move || handle_client(stream, sender));
            }
            Err(ref err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(err) => {
                warn!(target: "sim_bridge::server", error = %err, "client.accept_failed");
                thread::sleep(Duration::from_millis(200));
            }
        }
    });

    Ok(receiver)
}

fn handle_client(stream: TcpStream, sender: Sender<CommandRequest>) {
    if let Err(err) = stream.set_nonblocking(false) {
        warn!(target: "sim_bridge::server", error = %err, "client.setup_failed");
        return;
    }
    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(err) => {
            warn!(target: "sim_bridge::server", error = %err, "client.setup_failed");
            return;
        }
    };
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                // Blank lines are forwarded too; every line gets a response.
                let (reply, response) = bounded(1);
                let request = CommandRequest {
                    line: line.trim_end_matches(['\r', '\n']).to_string(),
                    reply,
                };
                if sender.send(request).is_err() {
                    break;
                }
                let Ok(response) = response.recv() else {
                    break;
                };
                if let Err(err) = write_response(&mut writer, &response) {
                    warn!(target: "sim_bridge::server", error = %err, "client.write_failed");
                    break;
                }
            }
            Err(err) => {
                warn!(target: "sim_bridge::server", error = %err, "client.read_failed");
                break;
            }
        }
    }
}

fn write_response(writer: &mut TcpStream, response: &Response) -> std::io::Result<()> {
    let mut encoded = serde_json::to_vec(response)?;
    encoded.push(b'\n');
    writer.write_all(&encoded)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_core::MemorySink;
    use bridge_runtime::Status;
    use std::net::Shutdown;

    fn queued(line: &str) -> (CommandRequest, Receiver<Response>) {
        let (reply, response) = bounded(1);
        let request = CommandRequest {
            line: line.to_string(),
            reply,
        };
        (request, response)
    }

    #[test]
    fn overdue_tick_serves_only_the_queued_backlog() {
        let (sender, commands) = unbounded();
        let mut replies = Vec::new();
        for line in ["status", "inventory", "research"] {
            let (request, reply) = queued(line);
            sender.send(request).unwrap();
            replies.push(reply);
        }

        let mut served = Vec::new();
        let result = serve_until(&commands, Instant::now(), |request| {
            served.push(request.line);
            // A client that answers every response with a new command.
            let (next, reply) = queued("status");
            sender.send(next).unwrap();
            replies.push(reply);
        });

        assert!(result.is_ok());
        assert_eq!(served, ["status", "inventory", "research"]);
        assert_eq!(commands.len(), 3);
    }

    #[test]
    fn serve_until_waits_for_the_deadline_when_idle() {
        let (_sender, commands) = unbounded::<CommandRequest>();
        let deadline = Instant::now() + Duration::from_millis(20);
        let mut served = 0;
        let result = serve_until(&commands, deadline, |_| served += 1);
        assert!(result.is_ok());
        assert_eq!(served, 0);
        assert!(Instant::now() >= deadline);
    }

    #[test]
    fn serve_until_reports_a_closed_listener() {
        let (sender, commands) = unbounded::<CommandRequest>();
        drop(sender);
        let deadline = Instant::now() + Duration::from_secs(5);
        assert_eq!(serve_until(&commands, deadline, |_| {}), Err(RecvError));
    }

    #[test]
    fn blank_lines_get_a_response() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (stream, _) = listener.accept().unwrap();
        let (sender, commands) = unbounded();
        let worker = thread::spawn(move || handle_client(stream, sender));

        client.write_all(b"\r\nstatus\n").unwrap();
        let mut bridge = Bridge::new(&BridgeConfig::default(), MemorySink::new()).unwrap();
        let mut world = SandboxWorld::new();
        for expected in ["", "status"] {
            let request = commands.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(request.line, expected);
            let response = bridge.dispatch(&mut world, &request.line);
            request.reply.send(response).unwrap();
        }
        client.shutdown(Shutdown::Write).unwrap();

        let reader = BufReader::new(client);
        let replies: Vec<Response> = reader
            .lines()
            .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
            .collect();
        worker.join().unwrap();

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].status, Status::Error);
        assert_eq!(replies[0].message, "Invalid command format");
        assert_eq!(replies[1].id, 2);
    }
}
