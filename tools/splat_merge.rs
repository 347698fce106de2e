use std::io::ErrorKind;

use byte_unit::{Byte, UnitType};
use clap::Parser;

use bevy_splat_aggregate::{
    AggregateSettings,
    SplatAggregator,
    SplatBuffer,
    io::{
        codec::SplatCodec,
        ply::parse_ply,
        splat::parse_splat,
        writer::write_splat_buffer_to_file,
    },
};


#[derive(Debug, Parser)]
#[command(about = "merge splat assets into one multi-node .gsplat file", version, long_about = None)]
struct SplatMergeArgs {
    /// `.ply`, `.splat` or `.gsplat` inputs, merged in order.
    #[arg(required = true)]
    inputs: Vec<String>,

    #[arg(long, short, default_value = "merged.gsplat")]
    output: String,

    #[command(flatten)]
    settings: AggregateSettings,
}


fn load_buffer(path: &str) -> Result<SplatBuffer, std::io::Error> {
    let extension = std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    match extension {
        "ply" => {
            let file = std::fs::File::open(path)?;
            let mut reader = std::io::BufReader::new(file);
            parse_ply(&mut reader)
        }
        "splat" => parse_splat(std::fs::read(path)?),
        "gsplat" => SplatBuffer::decode(&std::fs::read(path)?),
        _ => Err(std::io::Error::other(format!("unsupported input `{path}`"))),
    }
}

fn main() -> Result<(), std::io::Error> {
    let args = SplatMergeArgs::parse();

    let mut aggregator = SplatAggregator::new(args.settings);

    for input in &args.inputs {
        println!("merging `{input}`");

        let buffer = load_buffer(input)?;
        let splat_count = buffer.splat_count;

        let handle = aggregator
            .add_asset(buffer)
            .map_err(|err| std::io::Error::new(ErrorKind::InvalidData, err))?;

        println!(
            "  {} splats as node {}, aggregate now {} splats",
            splat_count,
            handle.node().0,
            aggregator.splat_count(),
        );
    }

    write_splat_buffer_to_file(&aggregator.to_buffer(), &args.output)?;

    let output_bytes = Byte::from_u64(std::fs::metadata(&args.output)?.len());
    println!(
        "wrote `{}` ({} nodes), output file size: {}",
        args.output,
        aggregator.node_count(),
        output_bytes.get_appropriate_unit(UnitType::Decimal)
    );

    Ok(())
}
