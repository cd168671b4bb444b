use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("lenio")
        .version("1.0.0")
        .author("Lenio Contributors")
        .about("Rewrite article content for easier reading")
        .arg(clap::arg!([INPUT] "URL to fetch, local HTML file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (html, text)")
                .value_name("FORMAT")
                .default_value("html")
                .value_parser(["html", "text"]),
        )
        .arg(clap::arg!(--endpoint <URL> "Generation service endpoint").default_value("http://127.0.0.1:8787"))
        .arg(clap::arg!(-l --reading_level <LEVEL> "Reading level 1-4 (overrides the calibrated profile)"))
        .arg(clap::arg!(--token_budget <NUM> "Estimated-token budget per chunk").default_value("800"))
        .arg(clap::arg!(--max_attempts <NUM> "Retry ceiling per chunk").default_value("20"))
        .arg(clap::arg!(--retry_delay <MS> "Delay between retry attempts in milliseconds").default_value("500"))
        .arg(
            clap::arg!(--min_content_len <NUM> "Minimum character length for content paragraphs")
                .default_value("50"),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout for fetching the input in seconds").default_value("30"))
        .arg(clap::arg!(--user_agent <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(--calibrate "Run the interactive reading-level calibration first"))
        .arg(
            clap::arg!(--profile <FILE> "Custom profile file location")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "lenio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "lenio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "lenio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "lenio", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
