/*
 * SPDX-FileCopyrightText: 2026 The shardrank developers
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::io::Write;
use std::path::PathBuf;

fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // Append the build date to the constants generated by built
    let out_dir: PathBuf = std::env::var_os("OUT_DIR")
        .expect("OUT_DIR is not set")
        .into();
    let mut built_rs = std::fs::OpenOptions::new()
        .append(true)
        .open(out_dir.join("built.rs"))
        .expect("Cannot open built.rs");
    writeln!(
        built_rs,
        "#[doc=r#\"The build date.\"#]\n#[allow(dead_code)]\npub const BUILD_DATE: &str = r\"{}\";",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
    .expect("Cannot write to built.rs");
}
