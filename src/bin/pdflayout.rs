//! Command-line front end for the `pdflayout` library.

use clap::{Parser, Subcommand};
use pdflayout::{
    dictionary, paginated_plain_text, table, Bbox, Config, DictionaryOptions, PdfiumBackend,
    TableOptions, TextOptions,
};

/// Extract structured, reading-order text from PDF documents.
#[derive(Parser)]
#[command(name = "pdflayout", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render plain text, one section per page.
    Plain {
        /// Path to the PDF file.
        path: String,
        /// Reorder blocks into reading order before rendering.
        #[arg(long)]
        sort: bool,
        /// Keep hyphenation sentinels as a literal "-\n" instead of
        /// rejoining the hyphenated word.
        #[arg(long)]
        keep_hyphens: bool,
        /// Page range, e.g. "1,3-5".
        #[arg(long)]
        page_range: Option<String>,
        /// Flatten annotations/form fields before extraction.
        #[arg(long)]
        flatten_pdf: bool,
        /// Worker count for page sharding.
        #[arg(long)]
        workers: Option<usize>,
        /// Drop duplicate overprinted glyphs (bold-simulation artifact).
        #[arg(long)]
        dedup_overprinted: bool,
    },
    /// Dump the structured layout tree as JSON-ish debug output.
    Json {
        /// Path to the PDF file.
        path: String,
        /// Reorder blocks into reading order.
        #[arg(long)]
        sort: bool,
        /// Keep per-span character detail.
        #[arg(long)]
        keep_chars: bool,
        /// Page range, e.g. "1,3-5".
        #[arg(long)]
        page_range: Option<String>,
        /// Flatten annotations/form fields before extraction.
        #[arg(long)]
        flatten_pdf: bool,
        /// Worker count for page sharding.
        #[arg(long)]
        workers: Option<usize>,
        /// Drop duplicate overprinted glyphs (bold-simulation artifact).
        #[arg(long)]
        dedup_overprinted: bool,
    },
    /// Reconstruct table cells inside caller-supplied rectangles.
    TableExtract {
        /// Path to the PDF file.
        path: String,
        /// 0-based page index the table rectangle lives on.
        #[arg(long)]
        page: usize,
        /// Table rectangle as "x0,y0,x1,y1" in the given image size.
        #[arg(long)]
        rect: String,
        /// Image width/height as "w,h" that `rect` is expressed in.
        #[arg(long, default_value = "1000,1000")]
        img_size: String,
    },
}

/// Parse a page-range string like `"1,3-5"` into a sorted, deduplicated,
/// 0-based page index list.
fn parse_range_str(spec: &str) -> Result<Vec<usize>, String> {
    let mut pages = std::collections::BTreeSet::new();
    for token in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if let Some((lo, hi)) = token.split_once('-') {
            let lo: usize = lo.parse().map_err(|_| format!("bad page range token {token}"))?;
            let hi: usize = hi.parse().map_err(|_| format!("bad page range token {token}"))?;
            if lo == 0 || hi == 0 || lo > hi {
                return Err(format!("bad page range token {token}"));
            }
            for p in lo..=hi {
                pages.insert(p - 1);
            }
        } else {
            let p: usize = token.parse().map_err(|_| format!("bad page token {token}"))?;
            if p == 0 {
                return Err(format!("bad page token {token}"));
            }
            pages.insert(p - 1);
        }
    }
    Ok(pages.into_iter().collect())
}

fn parse_rect(spec: &str) -> Result<Bbox, String> {
    let parts: Vec<f64> = spec
        .split(',')
        .map(|s| s.trim().parse().map_err(|_| format!("bad rect {spec}")))
        .collect::<Result<_, _>>()?;
    if parts.len() != 4 {
        return Err(format!("rect must have 4 components, got {spec}"));
    }
    Ok(Bbox::new(parts[0], parts[1], parts[2], parts[3]))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match cli.command {
        Command::Plain {
            path,
            sort,
            keep_hyphens,
            page_range,
            flatten_pdf,
            workers,
            dedup_overprinted,
        } => run_plain(
            &path,
            sort,
            keep_hyphens,
            page_range,
            flatten_pdf,
            workers,
            dedup_overprinted,
            &config,
        ),
        Command::Json {
            path,
            sort,
            keep_chars,
            page_range,
            flatten_pdf,
            workers,
            dedup_overprinted,
        } => run_json(
            &path,
            sort,
            keep_chars,
            page_range,
            flatten_pdf,
            workers,
            dedup_overprinted,
            &config,
        ),
        Command::TableExtract {
            path,
            page,
            rect,
            img_size,
        } => run_table(&path, page, &rect, &img_size, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn run_plain(
    path: &str,
    sort: bool,
    keep_hyphens: bool,
    page_range: Option<String>,
    flatten_pdf: bool,
    workers: Option<usize>,
    dedup_overprinted: bool,
    config: &Config,
) -> Result<(), String> {
    let page_range = page_range.map(|s| parse_range_str(&s)).transpose()?;
    let opts = TextOptions {
        sort,
        hyphens: keep_hyphens,
        page_range,
        flatten_pdf,
        workers,
        dedup_overprinted,
    };
    let pages = paginated_plain_text::<PdfiumBackend>(path, &opts, config).map_err(|e| e.to_string())?;
    for (i, text) in pages.iter().enumerate() {
        println!("--- page {i} ---");
        println!("{text}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_json(
    path: &str,
    sort: bool,
    keep_chars: bool,
    page_range: Option<String>,
    flatten_pdf: bool,
    workers: Option<usize>,
    dedup_overprinted: bool,
    config: &Config,
) -> Result<(), String> {
    let page_range = page_range.map(|s| parse_range_str(&s)).transpose()?;
    let opts = DictionaryOptions {
        sort,
        page_range,
        keep_chars,
        flatten_pdf,
        quote_loosebox: true,
        disable_links: false,
        workers,
        dedup_overprinted,
    };
    let pages = dictionary::<PdfiumBackend>(path, &opts, config).map_err(|e| e.to_string())?;
    for page in pages {
        println!("{}", serde_json::to_string_pretty(&page).map_err(|e| e.to_string())?);
    }
    Ok(())
}

fn run_table(path: &str, page: usize, rect: &str, img_size: &str, config: &Config) -> Result<(), String> {
    let rect = parse_rect(rect)?;
    let size_parts: Vec<f64> = img_size
        .split(',')
        .map(|s| s.trim().parse().map_err(|_| format!("bad img-size {img_size}")))
        .collect::<Result<_, _>>()?;
    if size_parts.len() != 2 {
        return Err(format!("img-size must have 2 components, got {img_size}"));
    }
    let tables = table::<PdfiumBackend>(
        path,
        &[(page, rect)],
        (size_parts[0], size_parts[1]),
        &TableOptions::default(),
        config,
    )
    .map_err(|e| e.to_string())?;
    for t in tables {
        for cell in t.cells {
            println!("{}\t{:?}", cell.text, cell.bbox);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_range_str_expands_and_dedupes() {
        let pages = parse_range_str("1,3-5,3").unwrap();
        assert_eq!(pages, vec![0, 2, 3, 4]);
    }

    #[test]
    fn parse_range_str_rejects_zero() {
        assert!(parse_range_str("0").is_err());
    }

    #[test]
    fn parse_rect_requires_four_components() {
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("1,2,3,4").is_ok());
    }
}
