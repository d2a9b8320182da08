use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use varsink::output_type::OutputType;

#[derive(Serialize)]
struct Detection {
    path: String,
    output_type: OutputType,
    file_type: bool,
    stream_type: bool,
    binary: bool,
}

/// Print the output type `path` resolves to
pub fn run(path: PathBuf, json: bool) -> Result<()> {
    let output_type = OutputType::try_resolve(&path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;

    if json {
        let detection = Detection {
            path: path.display().to_string(),
            output_type,
            file_type: output_type.is_file_type(),
            stream_type: output_type.is_stream_type(),
            binary: output_type.is_binary(),
        };
        println!("{}", serde_json::to_string_pretty(&detection)?);
        return Ok(());
    }

    println!("{}: {}", path.display(), output_type);
    if output_type == OutputType::Unspecified {
        println!(
            "  no output type could be inferred; recognized extensions are {}",
            OutputType::recognized_extensions()
        );
    }
    Ok(())
}
