use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use serload::config::{Config, MAX_CODE_LEN};
use serload::console::std_sync::StdoutWrapper;
use serload::pipeline::Pipeline;
use serload::stats::Stats;
use serload::storage::MemoryStorage;
use serload::worker::Io;
use serload_host::{init_logging, interrupt, Burst, PrintEngine, CTRL_D};
use termion::raw::IntoRawMode;

static STATS: Stats = Stats::new();

fn main() -> io::Result<()> {
    init_logging();

    let _raw = io::stdout().into_raw_mode()?;
    let config = Config::default();
    let mut pipeline: Pipeline = Pipeline::new();
    let done = AtomicBool::new(false);

    let main_thread = thread::current();
    let waker = main_thread.clone();
    let (mut intake, mut worker) = pipeline.split(&STATS, &config, move || waker.unpark());

    let mut console = StdoutWrapper::new();
    let mut storage = MemoryStorage::<4, MAX_CODE_LEN>::new();
    let mut engine = PrintEngine::default();

    thread::scope(|s| {
        // The reader thread plays the receive interrupt
        s.spawn(|| {
            let mut stdin = io::stdin();
            let mut buf = [0; 64];

            loop {
                let len = match stdin.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(len) => len,
                };

                let quit = buf[..len].contains(&CTRL_D);
                let mut burst = Burst::new(&buf[..len]);

                while interrupt(&mut intake, &mut burst) {
                    thread::yield_now();
                }

                if quit {
                    break;
                }
            }

            done.store(true, Ordering::Relaxed);
            main_thread.unpark();
        });

        let mut io = Io {
            console: &mut console,
            storage: &mut storage,
            engine: &mut engine,
        };

        worker.run(&mut io, || {
            thread::park();
            !done.load(Ordering::Relaxed)
        });

        worker.poll(&mut io);
    });

    print!("\r\n{}", STATS.snapshot());

    Ok(())
}
