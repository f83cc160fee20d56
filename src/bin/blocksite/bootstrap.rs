use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use regex::{Captures, Regex};

use crate::decompress::decompress_files;
use crate::{InitArgs, CFG_FILE_NAME};

fn get_sample_cfg() -> &'static str {
    include_str!("../../../res/blocksite.toml")
}

fn write_site_cfg(out_dir: &Path) -> Result<()> {
    let sample_cfg = replace_paths(out_dir, get_sample_cfg());
    let cfg_path = out_dir.join(CFG_FILE_NAME);
    fs::write(&cfg_path, sample_cfg)
        .with_context(|| format!("Error writing configuration {}", cfg_path.display()))
}

/// Points every `"res/..."` path of the sample config at `prefix`.
fn replace_paths(prefix: &Path, config_data: &str) -> String {
    let prefix = prefix.to_string_lossy();
    let prefix = prefix.trim_end_matches('/');

    let res_regex = Regex::new(r#""res/([^"]+)""#).unwrap();
    res_regex.replace_all(config_data, |caps: &Captures| {
        format!(r#""{}/{}""#, prefix, &caps[1])
    }).into_owned()
}

pub fn bootstrap_cmd(args: InitArgs) -> Result<()> {
    let out_path = PathBuf::from(&args.out_dir);
    fs::create_dir_all(&out_path)
        .with_context(|| format!("Error creating {}", out_path.display()))?;
    let out_path = fs::canonicalize(&out_path)
        .with_context(|| format!("Error converting path to absolute: {}", args.out_dir))?;

    if !out_path.is_dir() {
        return Err(anyhow!("Output path must be a directory: {}", out_path.display()));
    }

    decompress_files(&out_path).context("Error unpacking default resources")?;
    write_site_cfg(&out_path)?;

    println!("Site resources written to {}", out_path.display());
    println!("Set ARENA_CHANNEL, ARENA_TOKEN and OUTPUT_DIR, then run: blocksite -c {} build",
        out_path.join(CFG_FILE_NAME).display());
    Ok(())
}
