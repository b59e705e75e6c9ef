use std::io::Write;

use crate::catalog;
use crate::error::Result;
use crate::query::{AlbumFilter, Scope};
use crate::store::{Store, UserId};

pub const DEFAULT_SOURCE: &str = "gothic.ru / old.gothic.ru reviews archive";

/// Writes one line per album, in list order:
/// `Artist: X | Album: Y | Year: N | Label: L`. A zero year is left out like
/// a missing one. The last line has no newline.
pub fn export_metadata<W: Write>(store: &Store, source: &str, out: &mut W) -> Result<usize> {
    let entries =
        catalog::list_for_scope(store, UserId::DEFAULT, Scope::All, AlbumFilter::default())?;

    // lines are joined, not terminated
    writeln!(out, "Source: {}", source)?;

    for entry in &entries {
        let mut parts = vec![
            format!("Artist: {}", entry.artist.name),
            format!("Album: {}", entry.album.title),
        ];

        if let Some(year) = entry.album.year.filter(|&y| y != 0) {
            parts.push(format!("Year: {}", year));
        }

        if let Some(label) = entry.album.label.as_deref().filter(|l| !l.is_empty()) {
            parts.push(format!("Label: {}", label));
        }

        write!(out, "\n{}", parts.join(" | "))?;
    }

    out.flush()?;

    info!("exported {} albums", entries.len());

    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn export_of_empty_store_is_header_only() {
        let (_dir, source) = testutil::source();
        let store = source.get().unwrap();

        let mut out: Vec<u8> = Vec::new();
        assert_eq!(export_metadata(&store, "test", &mut out).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap(), "Source: test\n");
    }

    #[test]
    fn export_lists_albums_in_display_order() {
        let (_dir, source) = testutil::source();
        let store = source.get().unwrap();

        let b = testutil::artist(&store, "Bohemien");
        let a = testutil::artist(&store, "Anne Clark");
        testutil::album(&store, b, "Dark", Some(0));
        let album = testutil::album(&store, a, "Hopeless Cases", Some(1987));
        store
            .connection()
            .execute("UPDATE Album SET label = 'Virgin' WHERE album_id = ?", [album])
            .unwrap();

        let mut out: Vec<u8> = Vec::new();
        let count = export_metadata(&store, "test", &mut out).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Source: test\n\n\
             Artist: Anne Clark | Album: Hopeless Cases | Year: 1987 | Label: Virgin\n\
             Artist: Bohemien | Album: Dark"
        );
    }
}
