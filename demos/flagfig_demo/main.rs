//! # flagfig demo application
//!
//! A sample `serve` command that shows every value layer. It does not serve
//! anything; it prints the values it resolved.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example flagfig_demo -- --port 9000
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature            | How to exercise it                                                      |
//! |--------------------|-------------------------------------------------------------------------|
//! | Declared defaults  | `cargo run --example flagfig_demo`                                      |
//! | TOML input source  | Write `port = 9100` to `demo.toml`, add `-- --config demo.toml`         |
//! | Env var override   | `DEMO_PORT=9200 cargo run --example flagfig_demo -- --config demo.toml` |
//! | Command line       | `cargo run --example flagfig_demo -- --config demo.toml -p 9300`        |
//! | Slices from env    | `DEMO_TAGS=a,b cargo run --example flagfig_demo`                        |
//! | Durations          | `cargo run --example flagfig_demo -- --timeout 1m30s`                   |
//! | Debug logging      | `RUST_LOG=flagfig=debug cargo run --example flagfig_demo`               |

use flagfig::{
    BoolFlag, BoolValue, Command, DurationFlag, DurationValue, IntFlag, IntValue, StringFlag,
    StringSlice, StringSliceFlag, StringValue, format_duration, init_input_source,
    toml_source_from_flag,
};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut cmd = Command::new("serve")
        .usage("Print the resolved server settings")
        .flag(StringFlag::new("config", StringValue::default()).usage("TOML config file"))
        .flag(
            IntFlag::new("port", IntValue::new(8080))
                .alias("p")
                .env("DEMO_PORT")
                .usage("Port to listen on"),
        )
        .flag(
            DurationFlag::new("timeout", DurationValue::new(std::time::Duration::from_secs(30)))
                .env("DEMO_TIMEOUT")
                .usage("Request timeout"),
        )
        .flag(
            StringSliceFlag::new("tags", StringSlice::default())
                .env("DEMO_TAGS")
                .usage("Tags attached to every request"),
        )
        .flag(BoolFlag::new("help", BoolValue::default()).alias("h").usage("Show usage"))
        .before(init_input_source(toml_source_from_flag("config")))
        .action(|ctx| {
            let flags = ctx.flags();
            if flags.bool("help").unwrap_or_default() {
                return Ok(());
            }
            println!("port    = {}", flags.int("port").unwrap_or_default());
            println!(
                "timeout = {}",
                format_duration(flags.duration("timeout").unwrap_or_default())
            );
            println!("tags    = {:?}", flags.string_slice("tags").unwrap_or_default());
            println!("args    = {:?}", ctx.args());
            Ok(())
        });

    if std::env::args().any(|a| a == "-h" || a == "--help") {
        println!("{cmd}");
    }

    if let Err(e) = cmd.run(std::env::args().skip(1)) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
