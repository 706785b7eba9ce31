use libingr::{ColorEntry, ColorTable, VltEntry};

#[test]
fn igds_block_round_trips_through_encode_and_decode() -> anyhow::Result<()> {
    let entries = vec![
        ColorEntry {
            r: 10,
            g: 20,
            b: 30,
            a: 255,
        },
        ColorEntry {
            r: 200,
            g: 100,
            b: 0,
            a: 255,
        },
    ];
    let table = ColorTable::new(entries.clone());
    let block = table.to_igds()?;
    assert_eq!(block.len(), 768);

    // a decoded block always carries all 256 slots
    let decoded = ColorTable::from_igds(&block)?;
    assert_eq!(decoded.len(), 256);
    assert_eq!(&decoded.entries()[..2], entries.as_slice());
    assert!(decoded.entries()[2..]
        .iter()
        .all(|e| *e == ColorEntry::OPAQUE_BLACK));
    Ok(())
}

#[test]
fn short_igds_block_is_rejected() {
    assert!(ColorTable::from_igds(&[0u8; 767]).is_err());
}

#[test]
fn oversized_table_cannot_be_encoded_as_igds() {
    let table = ColorTable::new(vec![ColorEntry::OPAQUE_BLACK; 257]);
    assert!(table.to_igds().is_err());
}

#[test]
fn environ_v_records_are_sorted_and_gaps_are_filled() {
    // deliberately out of order, with slots 1, 3 and 4 missing
    let records = [
        VltEntry {
            slot: 5,
            r: 0,
            g: 0,
            b: 4095,
        },
        VltEntry {
            slot: 0,
            r: 4095,
            g: 0,
            b: 0,
        },
        VltEntry {
            slot: 2,
            r: 0,
            g: 4095,
            b: 0,
        },
    ];
    let table = ColorTable::from_environ_v(&records);
    assert_eq!(table.len(), 6);

    let e = table.entries();
    assert_eq!((e[0].r, e[0].g, e[0].b), (255, 0, 0));
    assert_eq!(e[1], ColorEntry::OPAQUE_BLACK);
    assert_eq!((e[2].r, e[2].g, e[2].b), (0, 255, 0));
    assert_eq!(e[3], ColorEntry::OPAQUE_BLACK);
    assert_eq!(e[4], ColorEntry::OPAQUE_BLACK);
    assert_eq!((e[5].r, e[5].g, e[5].b), (0, 0, 255));
}

#[test]
fn environ_v_channels_share_one_normalization_factor() {
    let records = [VltEntry {
        slot: 0,
        r: 2047,
        g: 1023,
        b: 0,
    }];
    let table = ColorTable::from_environ_v(&records);
    let entry = table.entries()[0];
    // factor is 255 over the largest channel of the whole table
    assert_eq!((entry.r, entry.g, entry.b), (255, 127, 0));
}

#[test]
fn all_zero_environ_v_records_normalize_to_black() {
    let records = [
        VltEntry {
            slot: 0,
            r: 0,
            g: 0,
            b: 0,
        },
        VltEntry {
            slot: 1,
            r: 0,
            g: 0,
            b: 0,
        },
    ];
    let table = ColorTable::from_environ_v(&records);
    assert_eq!(table.len(), 2);
    assert!(table.entries().iter().all(|e| *e == ColorEntry::OPAQUE_BLACK));
}

#[test]
fn duplicate_environ_v_slots_keep_the_first_record() {
    let records = [
        VltEntry {
            slot: 1,
            r: 4095,
            g: 0,
            b: 0,
        },
        VltEntry {
            slot: 1,
            r: 0,
            g: 4095,
            b: 0,
        },
    ];
    let table = ColorTable::from_environ_v(&records);
    assert_eq!(table.len(), 2);
    assert_eq!(table.entries()[0], ColorEntry::OPAQUE_BLACK);
    let kept = table.entries()[1];
    assert_eq!((kept.r, kept.g, kept.b), (255, 0, 0));
}

#[test]
fn environ_v_encoding_rescales_to_the_12_bit_range() {
    let table = ColorTable::new(vec![ColorEntry {
        r: 255,
        g: 128,
        b: 0,
        a: 255,
    }]);
    let records = table.to_environ_v();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].slot, 0);
    assert_eq!((records[0].r, records[0].g, records[0].b), (4095, 2055, 0));
}

#[test]
fn environ_v_byte_decoding_honors_the_record_count() -> anyhow::Result<()> {
    let table = ColorTable::new(vec![
        ColorEntry {
            r: 255,
            g: 0,
            b: 0,
            a: 255,
        },
        ColorEntry {
            r: 0,
            g: 0,
            b: 255,
            a: 255,
        },
    ]);
    let bytes = table.to_environ_v_bytes();
    assert_eq!(bytes.len(), 16);

    let decoded = ColorTable::from_environ_v_bytes(&bytes, 2)?;
    assert_eq!(decoded.len(), 2);
    assert_eq!(
        (decoded.entries()[0].r, decoded.entries()[1].b),
        (255, 255)
    );

    assert!(ColorTable::from_environ_v_bytes(&bytes[..10], 2).is_err());
    Ok(())
}

#[test]
fn environ_v_block_count_rounds_up_to_whole_blocks() {
    assert_eq!(ColorTable::new(vec![ColorEntry::OPAQUE_BLACK; 64]).environ_v_blocks(), 1);
    assert_eq!(ColorTable::new(vec![ColorEntry::OPAQUE_BLACK; 96]).environ_v_blocks(), 2);
}
