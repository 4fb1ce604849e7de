//! Stack item inspection CLI.
//!
//! Decodes a serialized stack item and prints it as an indented tree.
//!
//! # Usage
//! ```text
//! vmvalue <hex> [OPTIONS]
//! vmvalue --encode-example
//! vmvalue --list-syscalls
//! ```
//!
//! # Arguments
//! - `hex`: Serialized stack item, with or without a `0x` prefix
//!
//! # Options
//! - `--max-item-size <bytes>`: Largest byte array accepted (defaults to 1 MiB)
//! - `--max-array-size <count>`: Largest container accepted (defaults to 1024)
//!
//! # Examples
//! ```text
//! vmvalue 80030201010001ab820101010201ff
//! vmvalue 0x0001ab --max-item-size 16
//! ```

use std::env;
use std::fmt::Write as _;
use std::process;
use vm_interop::interop::registry::InteropRegistry;
use vm_interop::serialization::deserialize;
use vm_interop::serialization::serialize;
use vm_interop::virtual_machine::errors::HeapError;
use vm_interop::virtual_machine::heap::ValueHeap;
use vm_interop::virtual_machine::limits::ExecutionLimits;
use vm_interop::virtual_machine::stack_item::{MapKey, StackItem};
use vm_interop::{error, info};

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    match args[1].as_str() {
        "--encode-example" => {
            encode_example();
            return;
        }
        "--list-syscalls" => {
            list_syscalls();
            return;
        }
        _ => {}
    }

    let input = &args[1];
    let mut limits = ExecutionLimits::default();

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--max-item-size" | "--max-array-size") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                let value = args[i].parse::<usize>().unwrap_or_else(|_| {
                    error!("Invalid value for {k}: '{}' is not a valid number", args[i]);
                    process::exit(1);
                });
                if k == "--max-item-size" {
                    limits = limits.with_max_item_size(value);
                } else {
                    limits = limits.with_max_array_size(value);
                }
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let data = match hex::decode(input.strip_prefix("0x").unwrap_or(input)) {
        Ok(d) => d,
        Err(e) => {
            error!("Invalid hex input: {}", e);
            process::exit(1);
        }
    };

    let mut heap = ValueHeap::new();
    let item = match deserialize(&mut heap, &data, &limits) {
        Ok(item) => item,
        Err(e) => {
            error!("Decoding failed: {}", e);
            process::exit(1);
        }
    };

    match render_tree(&heap, &item) {
        Ok(tree) => print!("{tree}"),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }
}

/// Prints the hex encoding of `Array[1, [0xAB], Map{true: -1}]`.
fn encode_example() {
    let mut heap = ValueHeap::new();
    let root = match build_example(&mut heap) {
        Ok(root) => root,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    match serialize(&heap, &root, &ExecutionLimits::default()) {
        Ok(bytes) => println!("{}", hex::encode(bytes)),
        Err(e) => {
            error!("Encoding failed: {}", e);
            process::exit(1);
        }
    }
}

fn build_example(heap: &mut ValueHeap) -> Result<StackItem, HeapError> {
    let map = heap.new_map()?;
    if let StackItem::Map(handle) = map {
        heap.map_insert(handle, &StackItem::Boolean(true), StackItem::from(-1))?;
    }
    heap.new_array(vec![StackItem::from(1), StackItem::from(vec![0xAB]), map])
}

fn list_syscalls() {
    let registry = InteropRegistry::new();
    let width = registry.names().iter().map(|n| n.len()).max().unwrap_or(0);
    for name in registry.names() {
        let price = registry.price(name).unwrap_or_default();
        println!("{name:<width$} {price:>6}");
    }
}

/// Renders `item` as an indented tree, one node per line.
fn render_tree(heap: &ValueHeap, item: &StackItem) -> Result<String, HeapError> {
    let mut out = String::new();
    let mut pending: Vec<(usize, Option<String>, StackItem)> = vec![(0, None, item.clone())];

    while let Some((depth, label, item)) = pending.pop() {
        let _ = write!(out, "{}", "  ".repeat(depth));
        if let Some(label) = label {
            let _ = write!(out, "{label} => ");
        }
        match &item {
            StackItem::ByteArray(b) => {
                let _ = writeln!(out, "ByteArray 0x{}", hex::encode(b));
            }
            StackItem::Boolean(v) => {
                let _ = writeln!(out, "Boolean {v}");
            }
            StackItem::Integer(i) => {
                let _ = writeln!(out, "Integer {i}");
            }
            StackItem::Interop(host) => {
                let _ = writeln!(out, "Interop #{}", host.0);
            }
            StackItem::Array(h) | StackItem::Struct(h) => {
                let items = heap.items(*h)?;
                let _ = writeln!(out, "{} ({})", item.type_name(), items.len());
                for child in items.iter().rev() {
                    pending.push((depth + 1, None, child.clone()));
                }
            }
            StackItem::Map(h) => {
                let entries = heap.entries(*h)?;
                let _ = writeln!(out, "Map ({})", entries.len());
                for (key, value) in entries.iter().rev() {
                    pending.push((depth + 1, Some(describe_key(key)), value.clone()));
                }
            }
        }
    }
    Ok(out)
}

fn describe_key(key: &MapKey) -> String {
    match key {
        MapKey::ByteArray(b) => format!("0x{}", hex::encode(b)),
        MapKey::Boolean(v) => v.to_string(),
        MapKey::Integer(i) => i.to_string(),
    }
}

const USAGE: &str = "\
Stack Item Inspector

USAGE:
    {program} <hex> [OPTIONS]
    {program} --encode-example
    {program} --list-syscalls

ARGS:
    <hex>    Serialized stack item (optional 0x prefix)

OPTIONS:
    --max-item-size <bytes>    Largest byte array accepted (defaults to 1048576)
    --max-array-size <count>   Largest container accepted (defaults to 1024)
    --encode-example           Print the encoding of Array[1, [0xAB], Map{true: -1}]
    --list-syscalls            Print the built-in syscalls and their prices
    -h, --help                 Print this help message

EXAMPLES:
    # Decode a serialized array
    {program} 80030201010001ab820101010201ff

    # Decode with a tighter size limit
    {program} 0x0001ab --max-item-size 16
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}
