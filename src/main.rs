use clap::Parser;

/// protoxy: an interactive man-in-the-middle TCP proxy for studying and
/// manipulating unknown or proprietary protocols one chunk at a time.
#[derive(Parser, Debug)]
#[clap(version, author, about)]
struct Args {
    #[clap(long, help = "local port to listen for client connections on")]
    in_port: Option<u16>,
    #[clap(long, help = "upstream port to relay connections to")]
    out_port: Option<u16>,
    #[clap(long, default_value = "127.0.0.1", help = "upstream host to relay connections to")]
    out_ip: String,
    #[clap(long, action, help = "transmit every message immediately, without operator review")]
    auto_transmit: bool,
    #[clap(short, long, action = clap::ArgAction::Count,
           help = "show more in the debug console, may be provided multiple times")]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (in_port, out_port) = match (args.in_port, args.out_port) {
        (Some(in_port), Some(out_port)) if in_port != 0 && out_port != 0 => (in_port, out_port),
        _ => {
            eprintln!("both --in-port and --out-port must be specified");
            eprintln!("see --help for usage");
            std::process::exit(1);
        }
    };

    if let Err(e) = protoxy::run(in_port, args.out_ip, out_port, args.auto_transmit, args.verbose) {
        eprintln!("protoxy: {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
