use super::{Entry, MatrixTable};

struct LastEntry {
    contig_index: usize,
    entry: Entry,
}

/// Convert sparse entries into a fully materialized matrix
///
/// For each sample, the most recent present entry is tracked. An absent entry is filled with a
/// copy of the tracked entry when that entry has an END value on the same contig, with
/// position <= END. Any later present entry replaces the tracked entry whether or not it
/// carries END, so a present entry without END ends the reference block of its sample.
///
/// Returns the densified matrix table and the number of entries filled in
///
pub fn densify(mut mt: MatrixTable) -> (MatrixTable, usize) {
    let sample_count = mt.header.samples.len();
    let mut last_entries: Vec<Option<LastEntry>> = (0..sample_count).map(|_| None).collect();
    let mut filled_entry_count = 0;

    for row in mt.rows.iter_mut() {
        let locus = &row.key.locus;
        for (entry, last_entry) in row.entries.iter_mut().zip(last_entries.iter_mut()) {
            match entry {
                Some(x) => {
                    *last_entry = Some(LastEntry {
                        contig_index: locus.contig_index,
                        entry: x.clone(),
                    });
                }
                None => {
                    if let Some(last) = last_entry {
                        let is_in_block = last.contig_index == locus.contig_index
                            && last.entry.end.is_some_and(|end| end >= locus.position);
                        if is_in_block {
                            *entry = Some(last.entry.clone());
                            filled_entry_count += 1;
                        }
                    }
                }
            }
        }
    }

    (mt, filled_entry_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::matrix_table::{
        Call, ContigInfo, EntryFieldAvailability, Locus, MatrixRow, MatrixTableHeader, RowKey,
    };

    fn get_row(contig_index: usize, position: i64, entries: Vec<Option<Entry>>) -> MatrixRow {
        MatrixRow {
            key: RowKey {
                locus: Locus {
                    contig_index,
                    position,
                },
                alleles: vec![b"A".to_vec(), b"C".to_vec()],
            },
            entries,
        }
    }

    fn get_mt(rows: Vec<MatrixRow>) -> MatrixTable {
        let contig = |name: &str| ContigInfo {
            name: name.to_string(),
            length: None,
        };
        MatrixTable {
            header: MatrixTableHeader {
                reference_genome: "GRCh38".to_string(),
                contigs: vec![contig("chr1"), contig("chr2")],
                samples: vec!["S1".to_string(), "S2".to_string()],
                entry_fields: EntryFieldAvailability::default(),
            },
            rows,
        }
    }

    fn ref_block(end: i64, dp: i32) -> Option<Entry> {
        Some(Entry {
            gt: Some(Call::new(vec![0, 0])),
            dp: Some(dp),
            end: Some(end),
            ..Default::default()
        })
    }

    fn het(dp: i32) -> Option<Entry> {
        Some(Entry {
            gt: Some(Call::new(vec![0, 1])),
            dp: Some(dp),
            ..Default::default()
        })
    }

    #[test]
    fn test_densify_fills_reference_block() {
        let mt = get_mt(vec![
            get_row(0, 100, vec![ref_block(110, 7), het(12)]),
            get_row(0, 105, vec![None, het(15)]),
            get_row(0, 110, vec![None, None]),
            get_row(0, 111, vec![None, het(9)]),
        ]);

        let (mt, filled_entry_count) = densify(mt);
        assert_eq!(filled_entry_count, 2);

        let s1 = mt.rows[1].entries[0].as_ref().unwrap();
        assert_eq!(s1.dp, Some(7));
        assert_eq!(s1.gt, Some(Call::new(vec![0, 0])));

        // The block END is inclusive
        assert!(mt.rows[2].entries[0].is_some());

        // The second sample has no reference block
        assert!(mt.rows[2].entries[1].is_none());

        // Past the end of the block
        assert!(mt.rows[3].entries[0].is_none());
    }

    #[test]
    fn test_densify_stops_at_contig_boundary() {
        let mt = get_mt(vec![
            get_row(0, 100, vec![ref_block(5000, 7), het(12)]),
            get_row(1, 200, vec![None, het(15)]),
        ]);

        let (mt, filled_entry_count) = densify(mt);
        assert_eq!(filled_entry_count, 0);
        assert!(mt.rows[1].entries[0].is_none());
    }

    #[test]
    fn test_densify_present_entries_unchanged() {
        let mt = get_mt(vec![
            get_row(0, 100, vec![ref_block(200, 7), het(12)]),
            get_row(0, 150, vec![ref_block(200, 8), het(15)]),
            get_row(0, 160, vec![None, None]),
        ]);

        let (mt, filled_entry_count) = densify(mt);
        assert_eq!(filled_entry_count, 1);
        assert_eq!(mt.rows[1].entries[0].as_ref().unwrap().dp, Some(8));

        // The most recent reference block is used for filling
        assert_eq!(mt.rows[2].entries[0].as_ref().unwrap().dp, Some(8));
    }

    #[test]
    fn test_densify_entry_without_end_ends_reference_block() {
        let mt = get_mt(vec![
            get_row(0, 100, vec![ref_block(200, 7), het(12)]),
            get_row(0, 150, vec![het(30), het(15)]),
            get_row(0, 160, vec![None, None]),
        ]);

        let (mt, filled_entry_count) = densify(mt);
        assert_eq!(filled_entry_count, 0);
        assert_eq!(mt.rows[1].entries[0].as_ref().unwrap().dp, Some(30));
        assert!(mt.rows[2].entries[0].is_none());
    }
}
