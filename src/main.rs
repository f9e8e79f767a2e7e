use std::io::Write;

use anyhow::Context;
use httpline::{Client, Config, Method, Request};

const USAGE: &str = "usage: httpline [--events] [--method METHOD] [--data BODY] <url>";

struct Args {
    events: bool,
    method: Method,
    data: Option<String>,
    url: String,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut events = false;
    let mut method = Method::GET;
    let mut data = None;
    let mut url = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--events" => events = true,
            "--method" => {
                let m = args.next().context(USAGE)?;
                method = Method::from_str(&m.to_ascii_uppercase())
                    .with_context(|| format!("unknown method `{m}`"))?;
            }
            "--data" => data = Some(args.next().context(USAGE)?),
            _ if url.is_none() => url = Some(arg),
            _ => anyhow::bail!(USAGE),
        }
    }

    Ok(Args {
        events,
        method,
        data,
        url: url.context(USAGE)?,
    })
}

async fn run(args: Args, client: Client) -> anyhow::Result<()> {
    let mut request = Request::new(args.method, args.url);
    if let Some(data) = args.data {
        request = request.with_body(data);
    }

    if args.events {
        let mut count = 0usize;
        let response = client
            .stream_events(&request, |event| {
                count += 1;
                let mut out = std::io::stdout().lock();
                writeln!(out, "--- event {count} ---")?;
                out.write_all(event.to_wire().as_bytes())
            })
            .await?;
        tracing::info!(status = response.status, events = count, "Stream finished");
        return Ok(());
    }

    let response = client.execute(&request).await?;
    for url in &response.redirect_chain {
        tracing::info!(%url, "Redirected");
    }
    println!("{} {}", response.status, response.reason);
    for (k, v) in response.headers.iter() {
        println!("{k}: {v}");
    }
    println!();
    std::io::stdout().write_all(&response.body)?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = parse_args()?;
    let cfg = Config::load()?;
    let client = Client::new(cfg)?;

    tokio::select! {
        res = run(args, client) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    Ok(())
}
