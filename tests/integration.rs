//! End-to-end scenarios exercising the public `decode` entry point across
//! all three formats.

use aamva_barcode::{decode, CardType, Credential, DecodeOptions, Format, Sex, Units};

const LF: u8 = 0x0A;
const CR: u8 = 0x0D;

fn build_v01_envelope(
    iin: &str,
    version: u8,
    filetype: &[u8; 5],
    record_sep: u8,
    offset_bias: i64,
    elements: &[(&str, &str)],
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"DL");
    for (code, value) in elements {
        body.extend_from_slice(code.as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.push(LF);
    }
    body.push(CR);

    let header_len = 29i64;
    let real_offset = header_len;
    let declared_offset = real_offset + offset_bias;
    let length = body.len();

    let mut out = Vec::new();
    out.push(b'@');
    out.push(LF);
    out.push(record_sep);
    out.push(CR);
    out.extend_from_slice(filetype);
    out.extend_from_slice(iin.as_bytes());
    out.extend_from_slice(format!("{version:02}").as_bytes());
    out.extend_from_slice(b"01"); // single subfile entry
    out.extend_from_slice(b"DL");
    out.extend_from_slice(format!("{declared_offset:04}").as_bytes());
    out.extend_from_slice(format!("{length:04}").as_bytes());
    out.extend_from_slice(&body);
    out
}

fn build_v2plus_envelope(iin: &str, version: u8, elements: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"DL");
    for (code, value) in elements {
        body.extend_from_slice(code.as_bytes());
        body.extend_from_slice(value.as_bytes());
        body.push(LF);
    }
    body.push(CR);

    let header_len = 31i64;
    let offset = header_len;
    let length = body.len();

    let mut out = Vec::new();
    out.extend_from_slice(b"@\n\x1e\rANSI ");
    out.extend_from_slice(iin.as_bytes());
    out.extend_from_slice(format!("{version:02}").as_bytes());
    out.extend_from_slice(b"02"); // jurisdiction version
    out.extend_from_slice(b"01"); // entry count
    out.extend_from_slice(b"DL");
    out.extend_from_slice(format!("{offset:04}").as_bytes());
    out.extend_from_slice(format!("{length:04}").as_bytes());
    out.extend_from_slice(&body);
    out
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn s1_texas_magstripe() {
    init_tracing();
    let input = b"%TXAUSTIN^DOE$JOHN^12345 SHERBOURNE ST^?;63601538774194=150819810101?#\" 78729      C               1505130BLKBLK?";
    let record = match decode(input, &DecodeOptions::default()).unwrap() {
        Credential::DlId(r) => r,
        Credential::Cac(_) => panic!("expected a DL/ID record"),
    };
    assert_eq!(record.first, "JOHN");
    assert_eq!(record.last, "DOE");
    assert_eq!(record.city.as_deref(), Some("AUSTIN"));
    assert_eq!(record.state.as_deref(), Some("TX"));
    assert_eq!(record.iin, "636015");
    assert_eq!(record.units, Units::Imperial);
    assert!(record.issued.is_none());
}

#[test]
fn s2_florida_magstripe_overflow() {
    // A city name that fills the fixed 13-character city field leaves the
    // name with nowhere to go but directly after it in field 0, per
    // spec.md S2 — unlike S1's "AUSTIN", which is short enough to leave
    // the name in its own field and never reach this branch.
    let input = "%FLJACKSONVILLE JURKOV$ROMAN$^4818 N CLASSICAL BLVD^?;636010046217208=210119870101?#\" 33435      D NONE      NONE1508160BROBRO?";
    let record = match decode(input.as_bytes(), &DecodeOptions::default()).unwrap() {
        Credential::DlId(r) => r,
        Credential::Cac(_) => panic!("expected a DL/ID record"),
    };
    assert_eq!(record.first, "ROMAN");
    assert_eq!(record.last, "JURKOV");
    assert_eq!(record.city.as_deref(), Some("JACKSONVILLE"));
    assert_eq!(record.state.as_deref(), Some("FL"));
    assert_eq!(record.address.as_deref(), Some("4818 N CLASSICAL BLVD"));
    assert_eq!(record.dob, chrono::NaiveDate::from_ymd_opt(1987, 1, 1).unwrap());
    assert_eq!(record.expiry, chrono::NaiveDate::from_ymd_opt(2021, 1, 31).unwrap());
}

#[test]
fn s3_virginia_pdf417_v3() {
    let elements = [
        ("DCS", "MAURY"),
        ("DCT", "JUSTIN,WILLIAM"),
        ("DAG", "123 MAIN ST"),
        ("DAI", "RICHMOND"),
        ("DAJ", "VA"),
        ("DAK", "23219"),
        ("DCG", "USA"),
        ("DAQ", "T16700185"),
        ("DCF", "061234567"),
        ("DCA", "D"),
        ("DCB", "NONE"),
        ("DCD", "NONE"),
        ("DBC", "1"),
        ("DAU", "075 in"),
        ("DAY", "BLU"),
        ("DBA", "08142017"),
        ("DBB", "07151958"),
        ("DBD", "08142009"),
    ];
    let data = build_v2plus_envelope("636000", 3, &elements);
    let record = match decode(&data, &DecodeOptions::default()).unwrap() {
        Credential::DlId(r) => r,
        Credential::Cac(_) => panic!("expected a DL/ID record"),
    };
    assert_eq!(record.first, "JUSTIN");
    assert_eq!(record.middle.as_deref(), Some("WILLIAM"));
    assert_eq!(record.last, "MAURY");
    assert_eq!(record.sex, Sex::Male);
    assert_eq!(record.height.magnitude(), 75);
    assert_eq!(record.height.units(), Units::Imperial);
    assert_eq!(record.document.as_deref(), Some("061234567"));
    assert_eq!(record.version, 3);
    assert!(record.standards);
}

#[test]
fn s4_maryland_aamva_filetype_deviation() {
    let elements = [
        ("DAA", "JOHNSON,JACK,,3RD"),
        ("DAG", "1 MAIN ST"),
        ("DAI", "BALTIMORE"),
        ("DAJ", "MD"),
        ("DAK", "21201"),
        ("DAQ", "J123456789"),
        ("DAR", "C"),
        ("DAS", "NONE"),
        ("DAT", "NONE"),
        ("DBA", "20200101"),
        ("DBB", "19800101"),
        ("DBC", "1"),
        ("DBD", "20150101"),
        ("DAU", "070 in"),
    ];
    let data = build_v01_envelope("636003", 1, b"AAMVA", 0x1E, 0, &elements);
    let record = match decode(&data, &DecodeOptions::default()).unwrap() {
        Credential::DlId(r) => r,
        Credential::Cac(_) => panic!("expected a DL/ID record"),
    };
    assert_eq!(record.first, "JACK");
    assert_eq!(record.last, "JOHNSON");
    assert_eq!(record.version, 1);
    assert!(record.warnings.iter().any(|w| w.contains("AAMVA")));
    assert!(!record.standards);
}

#[test]
fn s5_south_carolina_deviation_and_offset_fixup() {
    let elements = [
        ("DAB", "SAMPLE"),
        ("DAC", "DRIVER"),
        ("DAD", "CREDENTIAL"),
        ("DAG", "1 MAIN ST"),
        ("DAI", "COLUMBIA"),
        ("DAJ", "SC"),
        ("DAK", "29201"),
        ("DAQ", "102245737"),
        ("DAR", "D"),
        ("DAS", "NONE"),
        ("DAT", "NONE"),
        ("DBA", "20250101"),
        ("DBB", "19900101"),
        ("DBC", "1"),
        ("DBD", "20200101"),
        ("DAU", "068 in"),
    ];
    // South Carolina's declared offset is one byte short of the real offset;
    // the parser's fixup brings it back in line.
    let data = build_v01_envelope("636005", 1, b"ANSI ", 0x1C, -1, &elements);
    let record = match decode(&data, &DecodeOptions::default()).unwrap() {
        Credential::DlId(r) => r,
        Credential::Cac(_) => panic!("expected a DL/ID record"),
    };
    assert_eq!(record.first, "DRIVER");
    assert_eq!(record.middle.as_deref(), Some("CREDENTIAL"));
    assert_eq!(record.last, "SAMPLE");
    assert_eq!(record.iin, "636005");
    assert_eq!(record.class.as_deref(), Some("D"));
    assert_eq!(record.sex, Sex::Male);
    assert!(record.warnings.iter().any(|w| w.contains("record separator")));
    assert!(!record.standards);
}

#[test]
fn s6_dod_cac_version_n() {
    use aamva_barcode::codec::int_to_base32;

    let mut data = vec![b' '; 89];
    data[0] = b'N';
    data[1..7].copy_from_slice(b"000001");
    data[7] = b'S';
    let edipi_encoded = int_to_base32(1_234_567_890);
    let edipi_bytes = format!("{edipi_encoded:0>7}").into_bytes();
    data[8..15].copy_from_slice(&edipi_bytes[..7]);
    data[15..35].copy_from_slice(format!("{:<20}", "JANE").as_bytes());
    data[35..61].copy_from_slice(format!("{:<26}", "DOE").as_bytes());
    data[61..65].copy_from_slice(b"0000"); // Julian offset 0 -> 1000-01-01
    data[65] = b'A';
    data[66] = b'N';
    data[67..69].copy_from_slice(b"01");
    data[69..75].copy_from_slice(b"SSGT  ");
    data[75..77].copy_from_slice(b"AF");
    data[77..79].copy_from_slice(b"06");
    data[79..83].copy_from_slice(b"0000");
    data[83..87].copy_from_slice(b"0000");
    data[87] = b'A';
    data[88] = b'Q';

    let options = DecodeOptions {
        formats: vec![Format::Cac],
        strict: true,
    };
    let record = match decode(&data, &options).unwrap() {
        Credential::Cac(r) => r,
        Credential::DlId(_) => panic!("expected a CAC record"),
    };
    assert_eq!(record.middle, Some('Q'));
    assert_eq!(record.dob, chrono::NaiveDate::from_ymd_opt(1000, 1, 1).unwrap());
    assert_eq!(record.first, "JANE");
    assert_eq!(record.last, "DOE");
}

#[test]
fn warnings_empty_iff_standards_true() {
    let input = b"%TXAUSTIN^DOE$JOHN^12345 SHERBOURNE ST^?;63601538774194=150819810101?#\" 78729      C               1505130BLKBLK?";
    let record = match decode(input, &DecodeOptions::default()).unwrap() {
        Credential::DlId(r) => r,
        Credential::Cac(_) => panic!("expected a DL/ID record"),
    };
    assert_eq!(record.warnings.is_empty(), record.standards);
}

#[test]
fn identity_card_when_restrictions_and_endorsements_absent() {
    let elements = [
        ("DCS", "NOLICENSE"),
        ("DAC", "ID"),
        ("DAD", "ONLY"),
        ("DDE", "N"),
        ("DDF", "N"),
        ("DDG", "N"),
        ("DAG", "1 MAIN ST"),
        ("DAI", "COLUMBIA"),
        ("DAJ", "SC"),
        ("DAK", "29201"),
        ("DCG", "USA"),
        ("DAQ", "000000000"),
        ("DCF", "000000000"),
        ("DBC", "1"),
        ("DAY", "BRO"),
        ("DAU", "068 in"),
        ("DBA", "20250101"),
        ("DBB", "19900101"),
        ("DBD", "20200101"),
    ];
    let data = build_v2plus_envelope("636005", 6, &elements);
    let record = match decode(&data, &DecodeOptions::default()).unwrap() {
        Credential::DlId(r) => r,
        Credential::Cac(_) => panic!("expected a DL/ID record"),
    };
    assert_eq!(record.card_type, CardType::IdentityCard);
    assert!(record.class.is_none());
}
