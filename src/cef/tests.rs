use super::*;
use std::io::{BufReader, Cursor};

const MINIMAL_CEF: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CEF version="1.0.0.0">
  <CompoundList instrumentConfiguration="Default">
    <Compound mppid="DC1" algo="FindByChromDeconv">
      <Location m="91.0542" rt="5.123" a="12345.6" y="2345" ri="1042.3" />
      <CompoundScores>
        <CpdScore algo="FindByChromDeconv" />
      </CompoundScores>
      <Results>
        <Molecule name="Toluene &amp; isomers" formula="C7H8">
          <Database>
            <Accession db="CAS" id="108-88-3" />
          </Database>
        </Molecule>
      </Results>
      <Spectrum type="FbF" cpdAlgo="FindByChromDeconv">
        <MSDetails scanType="Scan" is="EI" p="+" />
        <MSPeaks>
          <p x="91.0542" y="999.0" />
          <p x="92.0573" y="72.5" />
          <p x="64.6" y="3.25" />
        </MSPeaks>
      </Spectrum>
    </Compound>
    <Compound mppid="DC2" algo="FindByChromDeconv">
      <Location m="43.0" rt="6.5" />
      <Spectrum type="FbF">
        <MSPeaks>
          <p x="43.0" y="100" />
        </MSPeaks>
      </Spectrum>
    </Compound>
  </CompoundList>
</CEF>"#;

fn reader(content: &str) -> CefReader<BufReader<Cursor<Vec<u8>>>> {
    CefReader::new(
        BufReader::new(Cursor::new(content.as_bytes().to_vec())),
        "run1.cef",
    )
}

#[test]
fn test_parse_minimal_cef() {
    let mut reader = reader(MINIMAL_CEF);

    let first = reader.next_compound().unwrap().unwrap();
    assert_eq!(first.chemical_name.as_deref(), Some("Toluene & isomers"));
    assert_eq!(first.formula.as_deref(), Some("C7H8"));
    assert_eq!(first.cas_number.as_deref(), Some("108-88-3"));
    assert!((first.retention_time - 5.123).abs() < 1e-12);
    assert!((first.retention_index - 1042.3).abs() < 1e-12);
    assert!((first.max_area - 12345.6).abs() < 1e-9);
    assert_eq!(first.source_file, "run1.cef");
    let masses: Vec<u32> = first.peaks.iter().map(|p| p.mz).collect();
    assert_eq!(masses, vec![91, 92, 65]);
    assert!((first.peaks[1].intensity - 72.5).abs() < 1e-12);

    let second = reader.next_compound().unwrap().unwrap();
    assert_eq!(second.chemical_name, None);
    assert_eq!(second.formula, None);
    assert_eq!(second.cas_number, None);
    assert_eq!(second.retention_index, 0.0);
    assert_eq!(second.max_area, 0.0);
    assert_eq!(second.peaks.len(), 1);

    assert!(reader.next_compound().unwrap().is_none());
    assert!(reader.next_compound().unwrap().is_none());
}

#[test]
fn test_mass_rounding() {
    let content = r#"<CEF><CompoundList><Compound>
        <Location rt="1.0" />
        <Spectrum><MSPeaks><p x="12.4" y="1" /><p x="12.6" y="2" /><p x="12.5" y="3" /></MSPeaks></Spectrum>
    </Compound></CompoundList></CEF>"#;

    let record = reader(content).next_compound().unwrap().unwrap();
    let masses: Vec<u32> = record.peaks.iter().map(|p| p.mz).collect();
    assert_eq!(masses, vec![12, 13, 12]);
}

#[test]
fn test_missing_rt_is_malformed_and_reader_continues() {
    let content = r#"<CEF><CompoundList>
        <Compound><Location a="10" /><Spectrum><MSPeaks><p x="50" y="1" /></MSPeaks></Spectrum></Compound>
        <Compound><Location rt="2.5" /><Spectrum><MSPeaks><p x="51" y="1" /></MSPeaks></Spectrum></Compound>
    </CompoundList></CEF>"#;

    let results: Vec<_> = reader(content).collect();
    assert_eq!(results.len(), 2);
    match &results[0] {
        Err(CefError::MalformedRecord { index, .. }) => assert_eq!(*index, 0),
        other => panic!("expected malformed record, got {other:?}"),
    }
    let record = results[1].as_ref().unwrap();
    assert!((record.retention_time - 2.5).abs() < 1e-12);
}

#[test]
fn test_missing_location_and_empty_spectrum() {
    let content = r#"<CEF><CompoundList>
        <Compound><Spectrum><MSPeaks><p x="50" y="1" /></MSPeaks></Spectrum></Compound>
        <Compound><Location rt="1.0" /><Spectrum><MSPeaks /></Spectrum></Compound>
        <Compound />
    </CompoundList></CEF>"#;

    let results: Vec<_> = reader(content).collect();
    assert_eq!(results.len(), 3);
    assert!(results
        .iter()
        .all(|r| matches!(r, Err(CefError::MalformedRecord { .. }))));
}

#[test]
fn test_non_numeric_values_are_malformed() {
    let content = r#"<CEF><CompoundList>
        <Compound><Location rt="abc" /><Spectrum><MSPeaks><p x="50" y="1" /></MSPeaks></Spectrum></Compound>
        <Compound><Location rt="-1.0" /><Spectrum><MSPeaks><p x="50" y="1" /></MSPeaks></Spectrum></Compound>
        <Compound><Location rt="1.0" /><Spectrum><MSPeaks><p x="50" y="NaN" /></MSPeaks></Spectrum></Compound>
        <Compound><Location rt="1.0" ri="n/a" /><Spectrum><MSPeaks><p x="50" y="1" /></MSPeaks></Spectrum></Compound>
        <Compound><Location rt="1.0" /><Spectrum><MSPeaks><p x="50" y="-5" /></MSPeaks></Spectrum></Compound>
    </CompoundList></CEF>"#;

    let errors: Vec<_> = reader(content).filter_map(Result::err).collect();
    assert_eq!(errors.len(), 5);
    assert!(errors.iter().all(|e| !e.is_fatal()));
}

#[test]
fn test_only_first_spectrum_and_molecule_are_used() {
    let content = r#"<CEF><CompoundList><Compound>
        <Location rt="3.0" />
        <Location rt="9.0" />
        <Results>
            <Molecule name="First" formula="C2H6"><Database><Accession id="74-84-0" /><Accession id="0-0-0" /></Database></Molecule>
            <Molecule name="Second" formula="C3H8" />
        </Results>
        <Spectrum><MSPeaks><p x="30" y="100" /></MSPeaks></Spectrum>
        <Spectrum><MSPeaks><p x="44" y="100" /></MSPeaks></Spectrum>
    </Compound></CompoundList></CEF>"#;

    let record = reader(content).next_compound().unwrap().unwrap();
    assert_eq!(record.chemical_name.as_deref(), Some("First"));
    assert_eq!(record.cas_number.as_deref(), Some("74-84-0"));
    assert!((record.retention_time - 3.0).abs() < 1e-12);
    assert_eq!(record.peaks, vec![crate::compound::Peak::new(30, 100.0)]);
}

#[test]
fn test_molecule_outside_results_is_ignored() {
    let content = r#"<CEF><CompoundList><Compound>
        <Location rt="3.0" />
        <Molecule name="Stray" />
        <Spectrum><MSPeaks><p x="30" y="100" /></MSPeaks></Spectrum>
    </Compound></CompoundList></CEF>"#;

    let record = reader(content).next_compound().unwrap().unwrap();
    assert_eq!(record.chemical_name, None);
}

#[test]
fn test_unreadable_sources() {
    let mut truncated = reader("<CEF><CompoundList><Compound><Location rt=\"1\" />");
    let err = truncated.next_compound().unwrap_err();
    assert!(err.is_fatal());
    assert!(truncated.next().is_none());

    let mut plain_text = reader("this is not xml");
    assert!(matches!(
        plain_text.next_compound(),
        Err(CefError::UnreadableSource(_))
    ));

    let mut mismatched = reader("<CEF><CompoundList></CEF>");
    assert!(mismatched.next_compound().unwrap_err().is_fatal());
}

#[test]
fn test_read_cef_file_collects_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.cef");
    let content = MINIMAL_CEF.replace(r#"<Location m="43.0" rt="6.5" />"#, r#"<Location m="43.0" />"#);
    std::fs::write(&path, content).unwrap();

    let file = read_cef_file(&path).unwrap();
    assert_eq!(file.source_file, "batch.cef");
    assert_eq!(file.records.len(), 1);
    assert_eq!(file.malformed.len(), 1);
}

#[test]
fn test_mass_above_limit_is_malformed() {
    let content = r#"<CEF><CompoundList>
        <Compound><Location rt="1.0" /><Spectrum><MSPeaks><p x="4000000000" y="1" /></MSPeaks></Spectrum></Compound>
        <Compound><Location rt="2.0" /><Spectrum><MSPeaks><p x="100000.4" y="1" /></MSPeaks></Spectrum></Compound>
        <Compound><Location rt="3.0" /><Spectrum><MSPeaks><p x="100001" y="1" /></MSPeaks></Spectrum></Compound>
    </CompoundList></CEF>"#;

    let results: Vec<_> = reader(content).collect();
    assert_eq!(results.len(), 3);
    assert!(matches!(results[0], Err(CefError::MalformedRecord { index: 0, .. })));
    assert_eq!(results[1].as_ref().unwrap().peaks[0].mz, 100_000);
    assert!(matches!(results[2], Err(CefError::MalformedRecord { index: 2, .. })));
}

#[test]
fn test_huge_intensities_are_kept() {
    let content = r#"<CEF><CompoundList>
        <Compound><Location rt="1.0" /><Spectrum><MSPeaks><p x="50" y="1e160" /><p x="60" y="1e200" /></MSPeaks></Spectrum></Compound>
    </CompoundList></CEF>"#;

    let record = reader(content).next().unwrap().unwrap();
    assert_eq!(record.peaks[1].intensity, 1e200);
}
