use std::fs;

use everipc_wire::{CodecConfig, ItemDescriptor, RequestFlags, ResultList};
use serde::Serialize;
use tracing::debug;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, wire_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Debug, Serialize)]
struct FieldOutput {
    name: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct ItemOutput {
    index: usize,
    kind: &'static str,
    flags: u32,
    data_offset: u32,
    fields: Vec<FieldOutput>,
}

#[derive(Serialize)]
struct ListOutput {
    totitems: u32,
    numitems: u32,
    offset: u32,
    request_flags: String,
    sort_type: u32,
    sort_name: Option<&'static str>,
    data_size: usize,
    items: Vec<ItemOutput>,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = fs::read(&args.file)
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;
    let config = CodecConfig {
        strict_counts: !args.lenient,
        ..CodecConfig::default()
    };
    let list = ResultList::decode_with_config(bytes.into(), &config)
        .map_err(|err| wire_error("decode failed", err))?;
    debug!(items = list.len(), "decoded result list");

    let only = args.field.as_deref().map(parse_field).transpose()?;
    let items = list
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| describe_item(&list, index, item, only))
        .collect::<CliResult<Vec<_>>>()?;

    let header = list.header();
    let out = ListOutput {
        totitems: header.totitems,
        numitems: header.numitems,
        offset: header.offset,
        request_flags: format!("0x{:08X}", header.request_flags.bits()),
        sort_type: header.sort_type.0,
        sort_name: header.sort_type.name(),
        data_size: list.data().len(),
        items,
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_items_table(&out),
        OutputFormat::Pretty => {
            println!(
                "{} of {} items (offset {}), request flags {}, sort {}",
                out.numitems,
                out.totitems,
                out.offset,
                out.request_flags,
                out.sort_name.unwrap_or("unknown")
            );
            for item in &out.items {
                let fields = item
                    .fields
                    .iter()
                    .map(|f| format!("{}={}", f.name, f.value))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("[{}] {} {}", item.index, item.kind, fields);
            }
        }
        OutputFormat::Raw => {
            for item in &out.items {
                let values: Vec<_> = item.fields.iter().map(|f| f.value.as_str()).collect();
                println!("{}", values.join("\t"));
            }
        }
    }
    Ok(SUCCESS)
}

fn parse_field(input: &str) -> CliResult<RequestFlags> {
    let flag = RequestFlags::parse(input).map_err(|err| wire_error("invalid --field", err))?;
    if flag.field_name().is_none() {
        return Err(CliError::new(
            USAGE,
            format!("--field must name exactly one field: {input}"),
        ));
    }
    Ok(flag)
}

fn describe_item(
    list: &ResultList,
    index: usize,
    item: &ItemDescriptor,
    only: Option<RequestFlags>,
) -> CliResult<ItemOutput> {
    let context = format!("item {index}");
    let fields = match only {
        Some(flag) => {
            let value = list
                .resolve_field(index, flag)
                .map_err(|err| wire_error(&context, err))?;
            vec![(flag, value)]
        }
        None => list
            .fields(index)
            .map_err(|err| wire_error(&context, err))?,
    };

    Ok(ItemOutput {
        index,
        kind: item_kind(item),
        flags: item.flags.bits(),
        data_offset: item.data_offset,
        fields: fields
            .into_iter()
            .map(|(flag, value)| FieldOutput {
                name: flag.field_name().unwrap_or("UNKNOWN"),
                value,
            })
            .collect(),
    })
}

fn item_kind(item: &ItemDescriptor) -> &'static str {
    if item.is_drive() {
        "drive"
    } else if item.is_folder() {
        "folder"
    } else {
        "file"
    }
}

fn print_items_table(out: &ListOutput) {
    let field_names: Vec<&str> = out
        .items
        .first()
        .map(|item| item.fields.iter().map(|f| f.name).collect())
        .unwrap_or_default();

    let mut header = vec!["#", "KIND"];
    header.extend(field_names.iter().copied());

    let rows = out
        .items
        .iter()
        .map(|item| {
            let mut row = vec![item.index.to_string(), item.kind.to_string()];
            row.extend(item.fields.iter().map(|f| f.value.clone()));
            row
        })
        .collect();
    print_table(&header, rows);
    println!(
        "{} of {} items, offset {}",
        out.numitems, out.totitems, out.offset
    );
}
