//! Integration tests exercising full Trust Anchor -> CA -> signed-object
//! trees end to end, covering the scenarios the unit tests colocated
//! with each module don't reach on their own: multiple sibling CAs with
//! disjoint resource sets, decoding the CMS-wrapped Manifest back out of
//! its own DER to check it against the files actually published, and
//! byte-stable output given a fixed clock and a fixed key source.
//!
//! Grounded on krill's root-level `tests/integration_test.rs` (build a
//! full object tree against a `tempfile::tempdir()`, assert on what
//! ends up on disk) and on `examples/NLnetLabs-routinator/src/ber/*`
//! for the manual TLV-walking style used here to re-decode a
//! Manifest's `eContent`.

use chrono::{TimeZone, Utc};

use rpkiforge::asn1::decode;
use rpkiforge::asn1::{Reader, Tag};
use rpkiforge::ca::{Ca, Validity};
use rpkiforge::clock::FixedClock;
use rpkiforge::ghostbusters::Ghostbusters;
use rpkiforge::resources::{Afi, AsIdOrRange, AsResources, IpAddr, IpEntry, IpPrefix, IpResources, ResourceSet};
use rpkiforge::roa::{Roa, RoaNetwork};
use rpkiforge::signing::FixedKeyGen;
use rpkiforge::{publication, tal};

const TEST_KEY_PEM: &[u8] = include_bytes!("fixtures/test_key.pem");

fn validity() -> Validity {
    Validity { cert_days: 365, crl_days: 7, mft_days: 7 }
}

fn whole_world() -> ResourceSet {
    ResourceSet {
        ip: IpResources::build(vec![
            (Afi::V4, IpEntry::Prefix(IpPrefix::new(IpAddr::V4([0, 0, 0, 0]), 0))),
            (Afi::V6, IpEntry::Prefix(IpPrefix::new(IpAddr::V6([0; 16]), 0))),
        ])
        .unwrap(),
        asn: Some(AsResources::Entries(vec![AsIdOrRange::Range(0, u32::MAX)])),
    }
}

fn ip_only(octets: [u8; 4], prefixlen: u8) -> ResourceSet {
    ResourceSet {
        ip: IpResources::build(vec![(Afi::V4, IpEntry::Prefix(IpPrefix::new(IpAddr::V4(octets), prefixlen)))]).unwrap(),
        asn: None,
    }
}

/// Reads a Manifest's `fileList` back out of a fully-assembled CMS
/// `ContentInfo(SignedData)` DER, returning `(file, hash)` pairs.
/// Mirrors the wire structure `sigobj::assemble` builds: `ContentInfo`
/// SEQUENCE holding `[0] EXPLICIT SignedData`, whose `encapContentInfo`
/// holds `[0] EXPLICIT eContent OCTET STRING`, whose content is the
/// Manifest SEQUENCE itself.
fn decode_manifest_file_list(content_info_der: &[u8]) -> Vec<(String, [u8; 32])> {
    let mut ci = Reader::new(content_info_der).take_sequence().expect("ContentInfo SEQUENCE");
    ci.take_tlv().expect("contentType OID"); // id-signedData, unchecked here
    let signed_data_tlv = ci.take_tagged(Tag::ctx_constructed(0)).expect("[0] EXPLICIT SignedData");

    let mut sd = Reader::new(signed_data_tlv).take_sequence().expect("SignedData SEQUENCE");
    sd.take_tlv().expect("version"); // CMSVersion
    sd.take_tlv().expect("digestAlgorithms"); // SET
    let mut encap = sd.take_sequence().expect("encapContentInfo SEQUENCE");
    encap.take_tlv().expect("eContentType OID");
    let econtent_tlv = encap.take_tagged(Tag::ctx_constructed(0)).expect("[0] EXPLICIT eContent");
    let manifest_der = Reader::new(econtent_tlv).take_tagged(Tag::OCTET_STRING).expect("eContent OCTET STRING");

    let mut mft = Reader::new(manifest_der).take_sequence().expect("Manifest SEQUENCE");
    let manifest_number_tlv = mft.take_tlv().expect("manifestNumber");
    assert_eq!(manifest_number_tlv.tag, Tag::INTEGER, "version DEFAULT 0 must be omitted");
    mft.take_tlv().expect("thisUpdate"); // GeneralizedTime
    mft.take_tlv().expect("nextUpdate"); // GeneralizedTime
    mft.take_tlv().expect("fileHashAlg"); // OID

    let mut file_list = mft.take_sequence().expect("fileList SEQUENCE OF");
    let mut entries = Vec::new();
    while !file_list.is_empty() {
        let mut entry = file_list.take_sequence().expect("FileAndHash SEQUENCE");
        let file_tlv = entry.take_tagged(Tag::IA5_STRING).expect("file IA5String");
        let file = String::from_utf8(file_tlv.to_vec()).expect("file name is ASCII");
        let hash_tlv = entry.take_tagged(Tag::BIT_STRING).expect("hash BIT STRING");
        let (unused, bits) = decode::bit_string(hash_tlv).expect("BIT STRING content");
        assert_eq!(unused, 0);
        let mut hash = [0u8; 32];
        hash.copy_from_slice(bits);
        entries.push((file, hash));
    }
    entries
}

#[test]
fn two_disjoint_child_cas_publish_separate_subtrees() {
    rpkiforge::init();
    let clock = FixedClock::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0));
    let keygen = FixedKeyGen(TEST_KEY_PEM);

    let mut ta = Ca::new_ta("TA", "rsync://rpki.example.net/rpki", whole_world(), validity(), &clock, &keygen).unwrap();
    let ca1 = ta.issue_ca("CA1", ip_only([10, 0, 0, 0], 8), &clock, &keygen).unwrap();
    let ca2 = ta.issue_ca("CA2", ip_only([192, 168, 0, 0], 16), &clock, &keygen).unwrap();
    assert_ne!(ca1, ca2);

    let warnings = ta.seal(&clock, &keygen).unwrap();
    assert!(warnings.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let written = publication::publish(&ta, dir.path()).unwrap();

    let root = dir.path().join("rpki.example.net").join("rpki");
    assert!(written.contains(&root.join("TA").join("CA1").join("revoked.crl")));
    assert!(written.contains(&root.join("TA").join("CA1").join("manifest.mft")));
    assert!(written.contains(&root.join("TA").join("CA2").join("revoked.crl")));
    assert!(written.contains(&root.join("TA").join("CA2").join("manifest.mft")));

    // Disjoint resources: each child's subtree is untouched by the
    // other's issuance, and the TA's own manifest enumerates exactly its
    // own CRL plus both children's certificates.
    let manifest_der = ta.last_manifest_der.as_ref().expect("TA manifest");
    let entries = decode_manifest_file_list(manifest_der);
    let mut files: Vec<&str> = entries.iter().map(|(f, _)| f.as_str()).collect();
    files.sort();
    assert_eq!(files, vec!["CA1.cer", "CA2.cer", "revoked.crl"]);
}

#[test]
fn manifest_file_list_matches_the_files_actually_published() {
    rpkiforge::init();
    let clock = FixedClock::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0));
    let keygen = FixedKeyGen(TEST_KEY_PEM);

    let mut ta = Ca::new_ta("TA", "rsync://rpki.example.net/rpki", whole_world(), validity(), &clock, &keygen).unwrap();
    let idx = ta.issue_ca("CA", ip_only([10, 0, 0, 0], 8), &clock, &keygen).unwrap();
    let roa = Roa::new(65000, vec![RoaNetwork::new(IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 8), None).unwrap()]);
    ta.children[idx].issue_roa(roa, &clock, &keygen).unwrap();
    ta.seal(&clock, &keygen).unwrap();

    let ca = &ta.children[idx];
    let manifest_der = ca.last_manifest_der.as_ref().expect("CA manifest");
    let mut entries = decode_manifest_file_list(manifest_der);
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut expected: Vec<(String, [u8; 32])> = vec![
        ("revoked.crl".to_string(), rpkiforge::signing::sha256(&ca.last_crl_der).unwrap()),
    ];
    for object in &ca.objects {
        expected.push((object.filename.clone(), rpkiforge::signing::sha256(&object.der).unwrap()));
    }
    expected.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(entries.len(), expected.len());
    for ((got_file, got_hash), (want_file, want_hash)) in entries.iter().zip(expected.iter()) {
        assert_eq!(got_file, want_file);
        assert_eq!(got_hash, want_hash);
    }
}

#[test]
fn same_clock_and_key_source_produce_byte_identical_output() {
    rpkiforge::init();

    fn build_ta() -> Ca {
        let clock = FixedClock::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0));
        let keygen = FixedKeyGen(TEST_KEY_PEM);
        let mut ta = Ca::new_ta("TA", "rsync://rpki.example.net/rpki", whole_world(), validity(), &clock, &keygen).unwrap();
        let idx = ta.issue_ca("CA", ip_only([10, 0, 0, 0], 8), &clock, &keygen).unwrap();
        let roa = Roa::new(65000, vec![RoaNetwork::new(IpPrefix::new(IpAddr::V4([10, 0, 0, 0]), 8), None).unwrap()]);
        ta.children[idx].issue_roa(roa, &clock, &keygen).unwrap();
        let gbr = Ghostbusters::new("RPKI Operations");
        ta.children[idx].issue_ghostbusters(gbr, &clock, &keygen).unwrap();
        ta.seal(&clock, &keygen).unwrap();
        ta
    }

    let first = build_ta();
    let second = build_ta();

    assert_eq!(first.cert_der, second.cert_der);
    assert_eq!(first.last_crl_der, second.last_crl_der);
    assert_eq!(first.last_manifest_der, second.last_manifest_der);
    assert_eq!(first.children[0].cert_der, second.children[0].cert_der);
    assert_eq!(first.children[0].last_crl_der, second.children[0].last_crl_der);
    assert_eq!(first.children[0].last_manifest_der, second.children[0].last_manifest_der);
    assert_eq!(first.children[0].objects.len(), second.children[0].objects.len());
    for (a, b) in first.children[0].objects.iter().zip(second.children[0].objects.iter()) {
        assert_eq!(a.filename, b.filename);
        assert_eq!(a.der, b.der);
    }

    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    publication::publish(&first, dir_a.path()).unwrap();
    publication::publish(&second, dir_b.path()).unwrap();
    let tal_a = tal::write(&first, dir_a.path(), "TA").unwrap();
    let tal_b = tal::write(&second, dir_b.path(), "TA").unwrap();
    assert_eq!(std::fs::read(tal_a).unwrap(), std::fs::read(tal_b).unwrap());
}

#[test]
fn publishes_a_minimal_repo_and_a_matching_tal() {
    rpkiforge::init();
    let clock = FixedClock::new(Utc.ymd(2024, 1, 1).and_hms(0, 0, 0));
    let keygen = FixedKeyGen(TEST_KEY_PEM);

    let mut ta = Ca::new_ta("TA", "rsync://rpki.example.net/rpki", whole_world(), validity(), &clock, &keygen).unwrap();
    ta.seal(&clock, &keygen).unwrap();

    let dir = tempfile::tempdir().unwrap();
    publication::publish(&ta, dir.path()).unwrap();
    let tal_path = tal::write(&ta, dir.path(), "TA").unwrap();

    let contents = std::fs::read_to_string(&tal_path).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next().unwrap(), "rsync://rpki.example.net/rpki/TA.cer");
    assert_eq!(lines.next().unwrap(), "");
    let spki_b64 = lines.next().unwrap();
    let decoded = base64::decode(spki_b64).expect("valid base64 SPKI");
    assert_eq!(decoded, ta.subject_public_key_info_der());
}
