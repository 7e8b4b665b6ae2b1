use journal_tail::follow_journal;
use std::env;
use std::process;
use tokio_stream::StreamExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <journal_target>", args[0]);
        eprintln!(
            "  <journal_target> is '{}', a journal directory, or a journal file",
            journal_tail::LOCAL_SYSTEM_JOURNAL
        );
        process::exit(1);
    }

    let target = &args[1];

    match follow_journal(target).await {
        Ok(mut stream) => {
            println!("BootID: {}", stream.boot_id());
            while let Some(item) = stream.next().await {
                match item {
                    Ok(entry) => println!("{}", entry),
                    Err(e) => {
                        eprintln!("Error while following journal: {}", e);
                        process::exit(1);
                    }
                }
            }
        }
        Err(e) => {
            eprintln!("Error opening journal: {}", e);
            process::exit(1);
        }
    }
}
