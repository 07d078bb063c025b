use std::path::PathBuf;

use anyhow::Context;
use ccdict_core::{DictField, DictStore};
use clap::Parser;

#[derive(Parser)]
#[command(name = "inspect_redb")]
#[command(about = "Dump table sizes and sample rows of a ccdict database")]
struct Args {
    /// Database file
    #[arg(default_value = "ccdict.redb")]
    db: PathBuf,

    /// Number of dictionary rows to print
    #[arg(long, default_value_t = 5)]
    rows: usize,

    /// Print the rows indexed under this headword
    #[arg(long)]
    headword: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let store = DictStore::open(&args.db).with_context(|| format!("opening {}", args.db.display()))?;
    println!("Opened redb: {}", args.db.display());

    for table in store.table_stats()? {
        println!("  {:<20} {:>8} rows", table.name, table.rows);
    }
    match store.reconcile_stats()? {
        Some(meta) => println!(
            "reconcile: seeded={} joined={} cedict_orphans={} cedict_canto_orphans={} total={} cap={:?}",
            meta.stats.seeded,
            meta.stats.joined,
            meta.stats.cedict_orphans,
            meta.stats.cedict_canto_orphans,
            meta.stats.total(),
            meta.max_source_lines
        ),
        None => println!("reconcile: none recorded"),
    }

    let rows = match &args.headword {
        Some(headword) => {
            let ids = store
                .lookup_ids(DictField::Traditional, headword)?
                .unwrap_or_default();
            println!("{} row(s) under {}", ids.len(), headword);
            store.entries_by_ids(&ids)?
        }
        None => store.scan_entries()?.into_iter().take(args.rows).collect(),
    };
    for (id, entry) in rows {
        println!(
            "  [{}] {} {} [{}] {{{}}} /{}/{}",
            id,
            entry.traditional,
            entry.simplified,
            entry.pinyin.as_deref().unwrap_or(""),
            entry.jyutping.as_deref().unwrap_or(""),
            entry.english.as_deref().unwrap_or(""),
            entry.comment.as_deref().map(|c| format!(" # {}", c)).unwrap_or_default()
        );
    }

    if let Some(codes) = store.load_input_codes()? {
        println!("input codes: {} characters", codes.character_count());
        if let Some(headword) = &args.headword {
            for ch in headword.chars() {
                let key = ch.to_string();
                let glyphs: Vec<String> = codes.codes_for(&key).iter().map(|c| codes.translate(c)).collect();
                println!("  {} {:?} {}", ch, codes.codes_for(&key), glyphs.join(" "));
            }
        }
    }
    Ok(())
}
