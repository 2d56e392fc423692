use std::fs;

use everipc_wire::{QueryRequest, ALL_RESULTS};
use serde::Serialize;

use crate::cmd::InspectArgs;
use crate::exit::{io_error, wire_error, CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct RequestOutput {
    reply_target_id: u32,
    reply_message_id: u32,
    search_flags: u32,
    offset: u32,
    max_results: Option<u32>,
    request_flags: String,
    request_fields: Vec<&'static str>,
    sort_type: u32,
    sort_name: Option<&'static str>,
    search_string: String,
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = fs::read(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;
    let request = QueryRequest::decode(&bytes).map_err(|err| wire_error("decode failed", err))?;

    let out = RequestOutput {
        reply_target_id: request.reply_target_id,
        reply_message_id: request.reply_message_id,
        search_flags: request.search_flags.bits(),
        offset: request.offset,
        max_results: (request.max_results != ALL_RESULTS).then_some(request.max_results),
        request_flags: format!("0x{:08X}", request.request_flags.bits()),
        request_fields: request
            .request_flags
            .iter_names()
            .map(|(name, _)| name)
            .collect(),
        sort_type: request.sort_type.0,
        sort_name: request.sort_type.name(),
        search_string: request.search_string,
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table | OutputFormat::Pretty => {
            let max_results = out
                .max_results
                .map(|n| n.to_string())
                .unwrap_or_else(|| "all".to_string());
            let rows = vec![
                vec!["reply_target_id".to_string(), out.reply_target_id.to_string()],
                vec!["reply_message_id".to_string(), out.reply_message_id.to_string()],
                vec!["search_flags".to_string(), format!("0x{:08X}", out.search_flags)],
                vec!["offset".to_string(), out.offset.to_string()],
                vec!["max_results".to_string(), max_results],
                vec![
                    "request_flags".to_string(),
                    format!("{} ({})", out.request_flags, out.request_fields.join("|")),
                ],
                vec![
                    "sort_type".to_string(),
                    format!("{} ({})", out.sort_type, out.sort_name.unwrap_or("unknown")),
                ],
                vec!["search_string".to_string(), out.search_string.clone()],
            ];
            print_table(&["FIELD", "VALUE"], rows);
        }
        OutputFormat::Raw => println!("{}", out.search_string),
    }
    Ok(SUCCESS)
}
