use std::cell::Cell;

use serload::config::{ConfigBuilder, MAX_CODE_LEN};
use serload::console::std_sync::StdoutWrapper;
use serload::pipeline::Pipeline;
use serload::stats::Stats;
use serload::storage::MemoryStorage;
use serload::worker::Io;
use serload_host::{init_logging, interrupt, Burst, PrintEngine, CTRL_D};
use termion::raw::IntoRawMode;
use tokio::io::{self, AsyncReadExt};
use tokio::sync::Notify;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    init_logging();

    let _raw = std::io::stdout().into_raw_mode()?;
    let stats = Stats::new();
    let config = ConfigBuilder::new().with_echo(true).build();
    let notify = Notify::new();
    let done = Cell::new(false);

    let mut pipeline: Pipeline = Pipeline::new();
    let (mut intake, mut worker) = pipeline.split(&stats, &config, || notify.notify_one());

    let reader = async {
        let mut stdin = io::stdin();
        let mut buf = [0; 64];

        loop {
            let len = match stdin.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(len) => len,
            };

            let mut burst = Burst::new(&buf[..len]);

            while interrupt(&mut intake, &mut burst) {
                tokio::task::yield_now().await;
            }

            if buf[..len].contains(&CTRL_D) {
                break;
            }
        }

        done.set(true);
        notify.notify_one();
    };

    let processor = async {
        let mut console = StdoutWrapper::new();
        let mut storage = MemoryStorage::<4, MAX_CODE_LEN>::new();
        let mut engine = PrintEngine::default();
        let mut io = Io {
            console: &mut console,
            storage: &mut storage,
            engine: &mut engine,
        };

        loop {
            worker.poll(&mut io);

            if done.get() {
                break;
            }

            notify.notified().await;
        }

        worker.poll(&mut io);
    };

    tokio::join!(reader, processor);

    print!("\r\n{}", stats.snapshot());

    Ok(())
}
