//! End-to-end decoding of a synthetic NE executable.

use hobgoblin::ne::{entry::EntryBundle, resource::RESOURCE_FLAG_PRELOAD};
use hobgoblin::{ExeImage, ExeKind, LoadOptions};

const NE_HEADER_POS: usize = 0x40;

// NE-relative table offsets
const SEGMENT_TABLE_OFFSET: u16 = 0x40;
const RESOURCE_TABLE_OFFSET: u16 = 0x50;
const RES_NAME_TABLE_OFFSET: u16 = 0x68;
const MODULE_TABLE_OFFSET: u16 = 0x7a;
const IMPORT_TABLE_OFFSET: u16 = 0x7e;
const ENTRY_TABLE_OFFSET: u16 = 0x8a;
const NONRES_TABLE_POS: u32 = 0x1c0;

fn put_u16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn build_ne() -> Vec<u8> {
    let mut b = vec![0u8; 0x240];
    // MZ stub
    b[0] = b'M';
    b[1] = b'Z';
    b[0x18] = 0x40; // relocation_table_pos
    b[0x3c] = 0x40; // new_header_offset

    // NE header
    let h = NE_HEADER_POS;
    b[h] = b'N';
    b[h + 1] = b'E';
    b[h + 2] = 5; // linker_version
    put_u16(&mut b, h + 0x04, ENTRY_TABLE_OFFSET);
    put_u16(&mut b, h + 0x06, 20); // entry_table_size
    put_u16(&mut b, h + 0x1c, 2); // num_segment_entries
    put_u16(&mut b, h + 0x1e, 2); // num_module_entries
    put_u16(&mut b, h + 0x20, 22); // non_res_name_table_size
    put_u16(&mut b, h + 0x22, SEGMENT_TABLE_OFFSET);
    put_u16(&mut b, h + 0x24, RESOURCE_TABLE_OFFSET);
    put_u16(&mut b, h + 0x26, RES_NAME_TABLE_OFFSET);
    put_u16(&mut b, h + 0x28, MODULE_TABLE_OFFSET);
    put_u16(&mut b, h + 0x2a, IMPORT_TABLE_OFFSET);
    b[h + 0x2c..h + 0x30].copy_from_slice(&NONRES_TABLE_POS.to_le_bytes());
    put_u16(&mut b, h + 0x30, 2); // num_movable_entries
    put_u16(&mut b, h + 0x32, 9); // alignment_shift_count
    b[h + 0x36] = 0x02; // executable_type: Windows

    // segment table: segment 1 has file data at sector 1 << 9 = 0x200
    let seg = h + SEGMENT_TABLE_OFFSET as usize;
    put_u16(&mut b, seg, 1); // sector
    put_u16(&mut b, seg + 2, 0x20); // length
    put_u16(&mut b, seg + 4, 0); // flags: code
    put_u16(&mut b, seg + 6, 0x100); // min_alloc
    put_u16(&mut b, seg + 8, 0); // segment 2: no file data
    put_u16(&mut b, seg + 10, 0);
    put_u16(&mut b, seg + 12, 1); // flags: data
    put_u16(&mut b, seg + 14, 0);

    // resource table: shift 4, one ICON bucket with one integer resource
    // whose content aliases the segment data at 0x20 << 4 = 0x200
    let res = h + RESOURCE_TABLE_OFFSET as usize;
    put_u16(&mut b, res, 4); // resource shift count
    put_u16(&mut b, res + 2, 0x8003); // type: integer, ICON
    put_u16(&mut b, res + 4, 1); // count
    put_u16(&mut b, res + 10, 0x20); // offset, in shifted units
    put_u16(&mut b, res + 12, 0x02); // length, in shifted units
    put_u16(&mut b, res + 14, RESOURCE_FLAG_PRELOAD);
    put_u16(&mut b, res + 16, 0x8001); // id: integer 1
    put_u16(&mut b, res + 22, 0); // table terminator

    // resident names: module name first, then an exported entry
    let rn = h + RES_NAME_TABLE_OFFSET as usize;
    b[rn] = 7;
    b[rn + 1..rn + 8].copy_from_slice(b"FROBMOD");
    put_u16(&mut b, rn + 8, 0);
    b[rn + 10] = 4;
    b[rn + 11..rn + 15].copy_from_slice(b"INIT");
    put_u16(&mut b, rn + 15, 1);
    b[rn + 17] = 0;

    // module reference table: offsets into the imported names region
    let mt = h + MODULE_TABLE_OFFSET as usize;
    put_u16(&mut b, mt, 0);
    put_u16(&mut b, mt + 2, 7);

    // imported names
    let imp = h + IMPORT_TABLE_OFFSET as usize;
    b[imp] = 6;
    b[imp + 1..imp + 7].copy_from_slice(b"KERNEL");
    b[imp + 7] = 3;
    b[imp + 8..imp + 11].copy_from_slice(b"GDI");
    b[imp + 11] = 0;

    // entry table: a MOVEABLE bundle of two and a FIXED bundle of one in
    // segment 1
    let et = h + ENTRY_TABLE_OFFSET as usize;
    b[et..et + 20].copy_from_slice(&[
        0x02, 0xff, // bundle of 2, moveable
        0x00, 0x00, 0x00, 0x01, 0x10, 0x00, // seg 1, offset 0x10
        0x01, 0x00, 0x00, 0x01, 0x20, 0x00, // exported, seg 1, offset 0x20
        0x01, 0x01, // bundle of 1, fixed in segment 1
        0x00, 0x30, 0x00, // offset 0x30
        0x00,
    ]);

    // non-resident names, file-absolute
    let nr = NONRES_TABLE_POS as usize;
    b[nr] = 18;
    b[nr + 1..nr + 19].copy_from_slice(b"Frobnicator Module");
    put_u16(&mut b, nr + 19, 0);
    b[nr + 21] = 0;

    // shared segment/resource content
    for byte in &mut b[0x200..0x220] {
        *byte = 0xa5;
    }
    b
}

#[test]
fn detects_ne_and_keeps_mz() {
    let bytes = build_ne();
    let image = ExeImage::parse(&bytes).unwrap();
    assert_eq!(image.kind(), ExeKind::Ne);
    assert_eq!(image.mz().header.signature, 0x5a4d);
    assert_eq!(image.mz().header.new_header_offset, 0x40);
    let ne = image.ne().unwrap();
    assert_eq!(ne.header.signature, 0x454e);
    assert_eq!(ne.header_position, NE_HEADER_POS);
    assert!(image.pe().is_none());
}

#[test]
fn walks_entry_table_bundles() {
    let bytes = build_ne();
    let image = ExeImage::parse(&bytes).unwrap();
    let ne = image.ne().unwrap();
    assert_eq!(ne.entry_table.len(), 20);
    let bundles: Vec<_> = ne.entry_bundles().collect::<Result<_, _>>().unwrap();
    assert_eq!(bundles.len(), 2);
    match &bundles[0] {
        EntryBundle::Moveable { entries } => {
            assert_eq!(entries.len(), 2);
            assert_eq!((entries[0].ordinal, entries[1].ordinal), (1, 2));
        }
        other => panic!("expected moveable bundle, got {:?}", other),
    }
    match &bundles[1] {
        EntryBundle::Fixed { segment, entries } => {
            assert_eq!(*segment, 1);
            assert_eq!(entries[0].ordinal, 3);
        }
        other => panic!("expected fixed bundle, got {:?}", other),
    }
}

#[test]
fn name_tables_resolve() {
    let bytes = build_ne();
    let image = ExeImage::parse(&bytes).unwrap();
    let ne = image.ne().unwrap();
    assert_eq!(ne.module_name(), Some("FROBMOD"));
    assert_eq!(ne.module_description(), Some("Frobnicator Module"));
    assert_eq!(ne.resident_names[1].name, "INIT");
    assert_eq!(ne.resident_names[1].ordinal, 1);
    assert_eq!(ne.imported_names, ["KERNEL", "GDI"]);
    assert_eq!(ne.module_names, ["KERNEL", "GDI"]);
}

#[test]
fn headers_only_skips_raw_data() {
    let bytes = build_ne();
    let image = ExeImage::parse(&bytes).unwrap();
    let ne = image.ne().unwrap();
    assert_eq!(ne.segments.len(), 2);
    assert!(ne.segments[0].data.is_none());
    assert!(ne.resources.buckets[0].resources[0].data.is_none());
}

#[test]
fn segment_data_loads_on_request() {
    let bytes = build_ne();
    let image = ExeImage::parse_with_opts(&bytes, LoadOptions::SEGMENT_DATA).unwrap();
    let ne = image.ne().unwrap();
    let segment = &ne.segments[0];
    assert!(!segment.is_data());
    assert_eq!(segment.file_length(), 0x20);
    assert_eq!(segment.data, Some(&bytes[0x200..0x220]));
    assert!(ne.segments[1].data.is_none());
    assert!(ne.segments[1].is_data());
}

#[test]
fn resources_scale_by_their_own_shift() {
    let bytes = build_ne();
    let image = ExeImage::parse_with_opts(&bytes, LoadOptions::RESOURCE_DATA).unwrap();
    let ne = image.ne().unwrap();
    assert_eq!(ne.resources.shift_count, 4);
    assert_eq!(ne.header.alignment_shift_count, 9);
    let bucket = &ne.resources.buckets[0];
    assert_eq!(bucket.integer_type(), Some(3));
    let resource = &bucket.resources[0];
    assert_eq!(resource.integer_id(), Some(1));
    assert!(resource.is_preload());
    let (start, end) = resource.file_range(ne.resources.shift_count);
    assert_eq!((start, end), (0x200, 0x220));
    assert!(end <= bytes.len());
    assert_eq!(resource.data, Some(&bytes[0x200..0x220]));
}

#[test]
fn decoding_is_deterministic() {
    let bytes = build_ne();
    let first = ExeImage::parse_with_opts(&bytes, LoadOptions::ALL).unwrap();
    let second = ExeImage::parse_with_opts(&bytes, LoadOptions::ALL).unwrap();
    assert_eq!(format!("{:?}", first), format!("{:?}", second));
    assert_eq!(first.ne(), second.ne());
}
