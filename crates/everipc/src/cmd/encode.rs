use std::fs;

use everipc_wire::{QueryRequest, RequestFlags, SearchFlags, SortOrder, ALL_RESULTS};
use serde::Serialize;
use tracing::info;

use crate::cmd::EncodeArgs;
use crate::exit::{io_error, wire_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{hex_dump, hex_string, print_json, print_raw, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput {
    size: usize,
    hex: String,
    written_to: Option<String>,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let request = build_request(&args)?;
    let bytes = request
        .to_bytes()
        .map_err(|err| wire_error("encode failed", err))?;

    if let Some(path) = &args.out {
        fs::write(path, &bytes)
            .map_err(|err| io_error(&format!("failed writing {}", path.display()), err))?;
        info!(path = %path.display(), size = bytes.len(), "wrote query2 request");
    }

    let out = EncodeOutput {
        size: bytes.len(),
        hex: hex_string(&bytes),
        written_to: args.out.as_ref().map(|p| p.display().to_string()),
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("QUERY2 request: {} bytes", out.size);
            print!("{}", hex_dump(&bytes));
        }
        OutputFormat::Raw => {
            if args.out.is_none() {
                print_raw(&bytes);
            }
        }
    }
    Ok(SUCCESS)
}

fn build_request(args: &EncodeArgs) -> CliResult<QueryRequest> {
    let request_flags =
        RequestFlags::parse(&args.request).map_err(|err| wire_error("invalid --request", err))?;
    Ok(QueryRequest {
        reply_target_id: args.reply_target,
        reply_message_id: args.reply_message,
        search_flags: parse_search_flags(&args.search_flags)?,
        offset: args.offset,
        max_results: parse_max_results(&args.max_results)?,
        request_flags,
        sort_type: parse_sort(&args.sort)?,
        search_string: args.search.clone(),
    })
}

fn parse_search_flags(names: &[String]) -> CliResult<SearchFlags> {
    let mut flags = SearchFlags::empty();
    for name in names {
        let normalized = name.trim().to_ascii_uppercase().replace('-', "_");
        if normalized.is_empty() {
            continue;
        }
        flags |= SearchFlags::from_name(&normalized)
            .ok_or_else(|| CliError::new(USAGE, format!("unknown search flag: {name}")))?;
    }
    Ok(flags)
}

fn parse_max_results(input: &str) -> CliResult<u32> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Ok(ALL_RESULTS);
    }
    input
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid --max-results value: {input}")))
}

fn parse_sort(input: &str) -> CliResult<SortOrder> {
    let input = input.trim();
    if let Ok(code) = input.parse::<u32>() {
        return Ok(SortOrder(code));
    }
    let normalized = input.to_ascii_uppercase().replace('-', "_");
    SortOrder::known()
        .iter()
        .copied()
        .find(|sort| sort.name() == Some(normalized.as_str()))
        .ok_or_else(|| CliError::new(USAGE, format!("unknown sort order: {input}")))
}
