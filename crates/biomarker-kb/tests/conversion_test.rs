//! Integration tests for JSON <-> TSV conversion.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tempfile::{NamedTempFile, TempDir};

use biomarker_kb::enrich::{
    CachedLookup, CitationMetadata, EntityMetadata, JsonFileCache, MockLookup, OfflineLookup,
};
use biomarker_kb::input::{load_document, parse_document, read_rows};
use biomarker_kb::model::EvidenceTag;
use biomarker_kb::{
    BiomarkerRecord, ConversionConfig, ConversionError, Converter, Direction, EvidenceSource, Row,
    WarningKind, COLUMNS,
};

/// Helper to create a temporary file with given content and extension.
fn create_test_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

fn read_tsv(path: &Path) -> Vec<Row> {
    read_rows(File::open(path).expect("open TSV")).expect("read TSV")
}

fn sorted_rows(mut rows: Vec<Row>) -> Vec<Row> {
    rows.sort_by(|a, b| a.cells().cmp(&b.cells()));
    rows
}

/// Sort every list whose order carries no meaning.
fn normalize(mut records: Vec<BiomarkerRecord>) -> Vec<BiomarkerRecord> {
    fn sort_tags(tags: &mut [EvidenceTag]) {
        tags.sort_by(|a, b| a.tag.cmp(&b.tag));
    }

    fn evidence_key(evidence: &EvidenceSource) -> (String, String) {
        (evidence.source_label(), evidence.joined_text("|"))
    }

    records.sort_by(|a, b| a.biomarker_id.cmp(&b.biomarker_id));
    for record in &mut records {
        for evidence in &mut record.evidence_source {
            sort_tags(&mut evidence.tags);
        }
        record.evidence_source.sort_by_key(evidence_key);

        for component in &mut record.biomarker_component {
            component
                .specimen
                .sort_by(|a, b| (&a.name, &a.id, &a.loinc_code).cmp(&(&b.name, &b.id, &b.loinc_code)));
            for evidence in &mut component.evidence_source {
                sort_tags(&mut evidence.tags);
            }
            component.evidence_source.sort_by_key(evidence_key);
        }
        record.biomarker_component.sort_by(|a, b| {
            (&a.biomarker, &a.assessed_biomarker_entity_id).cmp(&(&b.biomarker, &b.assessed_biomarker_entity_id))
        });
    }
    records
}

fn header() -> String {
    COLUMNS.join("\t")
}

/// The example record: EGFR measured in blood and tissue, with evidence
/// scoped to the blood specimen only.
const AA0001_EXAMPLE: &str = r#"[
  {
    "biomarker_id": "AA0001",
    "biomarker_component": [
      {
        "biomarker": "increased level of EGFR",
        "assessed_biomarker_entity": { "recommended_name": "EGFR", "synonyms": [] },
        "assessed_biomarker_entity_id": "HGNC:3236",
        "assessed_entity_type": "gene",
        "specimen": [
          { "name": "blood", "id": "UBERON:0000178", "name_space": "Uberon", "url": "", "loinc_code": "" },
          { "name": "tissue", "id": "UBERON:0000479", "name_space": "Uberon", "url": "", "loinc_code": "" }
        ],
        "evidence_source": [
          {
            "id": "29214994",
            "database": "PubMed",
            "evidence_list": [{ "evidence": "elevated in blood" }],
            "tags": [{ "tag": "specimen:UBERON:0000178" }]
          }
        ]
      }
    ],
    "best_biomarker_role": [{ "role": "diagnostic" }],
    "evidence_source": [],
    "citation": []
  }
]"#;

/// Two records exercising component and record evidence, a LOINC-only
/// specimen and an exposure agent.
const KNOWLEDGE_BASE: &str = r#"[
  {
    "biomarker_id": "AA0001",
    "biomarker_component": [
      {
        "biomarker": "increased level of EGFR",
        "assessed_biomarker_entity": { "recommended_name": "EGFR", "synonyms": [] },
        "assessed_biomarker_entity_id": "HGNC:3236",
        "assessed_entity_type": "gene",
        "specimen": [
          { "name": "blood", "id": "UBERON:0000178", "name_space": "Uberon", "url": "", "loinc_code": "" },
          { "name": "tissue", "id": "UBERON:0000479", "name_space": "Uberon", "url": "", "loinc_code": "" }
        ],
        "evidence_source": [
          {
            "id": "1",
            "database": "PubMed",
            "evidence_list": [{ "evidence": "elevated in blood" }],
            "tags": [{ "tag": "specimen:UBERON:0000178" }]
          },
          {
            "id": "2",
            "database": "PubMed",
            "evidence_list": [{ "evidence": "EGFR amplification" }, { "evidence": "n=120; p<0.01" }],
            "tags": [{ "tag": "biomarker" }, { "tag": "assessed_biomarker_entity" }]
          }
        ]
      }
    ],
    "best_biomarker_role": [{ "role": "diagnostic" }, { "role": "prognostic" }],
    "condition": {
      "id": "DOID:1324",
      "recommended_name": {
        "id": "DOID:1324",
        "name": "lung cancer",
        "description": null,
        "resource": "Disease Ontology",
        "url": "https://disease-ontology.org/?id=DOID:1324"
      },
      "synonyms": []
    },
    "evidence_source": [
      {
        "id": "2",
        "database": "PubMed",
        "evidence_list": [{ "evidence": "EGFR amplification" }, { "evidence": "n=120; p<0.01" }],
        "tags": [{ "tag": "condition" }]
      },
      {
        "id": "3",
        "database": "PubMed",
        "evidence_list": [{ "evidence": "risk factor" }],
        "tags": [{ "tag": "best_biomarker_role" }]
      }
    ],
    "citation": []
  },
  {
    "biomarker_id": "AA0002",
    "biomarker_component": [
      {
        "biomarker": "mutation in TP53",
        "assessed_biomarker_entity": { "recommended_name": "TP53", "synonyms": [] },
        "assessed_biomarker_entity_id": "HGNC:11998",
        "assessed_entity_type": "gene",
        "specimen": [],
        "evidence_source": [
          {
            "id": "4",
            "database": "PubMed",
            "evidence_list": [{ "evidence": "frequent mutation" }],
            "tags": [{ "tag": "biomarker" }]
          }
        ]
      },
      {
        "biomarker": "decreased level of caffeine",
        "assessed_biomarker_entity": { "recommended_name": "caffeine", "synonyms": [] },
        "assessed_biomarker_entity_id": "CHEBI:27732",
        "assessed_entity_type": "metabolite",
        "specimen": [
          { "name": "", "id": "", "name_space": "", "url": "", "loinc_code": "2857-1" }
        ],
        "evidence_source": [
          {
            "id": "5",
            "database": "PubMed",
            "evidence_list": [{ "evidence": "serum measurement" }],
            "tags": [{ "tag": "loinc_code:2857-1" }]
          }
        ]
      }
    ],
    "best_biomarker_role": [{ "role": "risk" }],
    "exposure_agent": {
      "id": "CHEBI:27732",
      "recommended_name": { "id": "CHEBI:27732", "name": "caffeine", "resource": "Chebi" }
    },
    "evidence_source": [],
    "citation": []
  }
]"#;

/// JSON -> TSV -> JSON through files, returning both outputs.
fn round_trip(dir: &TempDir, json: &str, name: &str) -> (Vec<Row>, Vec<BiomarkerRecord>) {
    let source = dir.path().join(format!("{}.json", name));
    let table = dir.path().join(format!("{}.tsv", name));
    let rebuilt = dir.path().join(format!("{}.rebuilt.json", name));
    fs::write(&source, json).unwrap();

    let mut converter = Converter::new(ConversionConfig::default());
    converter.convert(&source, &table).expect("flatten failed");
    converter.convert(&table, &rebuilt).expect("rebuild failed");

    (read_tsv(&table), load_document(&rebuilt).expect("load rebuilt"))
}

// =============================================================================
// Flatten Tests
// =============================================================================

#[test]
fn test_example_two_specimens_one_scoped_evidence() {
    let records = parse_document(AA0001_EXAMPLE.as_bytes()).unwrap();
    let converter = Converter::new(ConversionConfig::default());
    let (rows, _) = converter.flatten_records(&records).unwrap();

    assert_eq!(rows.len(), 2);

    let blood = rows.iter().find(|r| r.specimen == "blood").unwrap();
    assert_eq!(blood.evidence, "elevated in blood");
    assert_eq!(blood.tag, "specimen:UBERON:0000178");
    assert_eq!(blood.evidence_source, "PubMed:29214994");

    let tissue = rows.iter().find(|r| r.specimen == "tissue").unwrap();
    assert!(tissue.evidence.is_empty());
    assert!(tissue.evidence_source.is_empty());
    assert!(tissue.tag.is_empty());
}

#[test]
fn test_flatten_file_has_header_and_rows() {
    let dir = TempDir::new().unwrap();
    let source = create_test_file(AA0001_EXAMPLE, ".json");
    let target = dir.path().join("out.tsv");

    let mut converter = Converter::new(ConversionConfig::default());
    let report = converter.convert(source.path(), &target).unwrap();

    assert_eq!(report.direction, Direction::Flatten);
    assert_eq!(report.records, 1);
    assert_eq!(report.rows, 2);
    assert!(report.source.hash.starts_with("sha256:"));

    let text = fs::read_to_string(&target).unwrap();
    assert_eq!(text.lines().next().unwrap(), header());
    assert_eq!(text.lines().count(), 3);
}

#[test]
fn test_tag_scoping_object_tags() {
    let records = parse_document(KNOWLEDGE_BASE.as_bytes()).unwrap();
    let converter = Converter::new(ConversionConfig::default());
    let (rows, _) = converter.flatten_records(&records).unwrap();

    for row in &rows {
        for token in row.tag_tokens() {
            if let Some(value) = token.strip_prefix("specimen:") {
                assert_eq!(value, row.specimen_id, "specimen tag on wrong row: {:?}", row);
            }
            if let Some(value) = token.strip_prefix("loinc_code:") {
                assert_eq!(value, row.loinc_code, "LOINC tag on wrong row: {:?}", row);
            }
        }
    }

    assert!(!rows
        .iter()
        .any(|r| r.specimen == "tissue" && r.evidence == "elevated in blood"));
}

#[test]
fn test_record_evidence_spliced_not_duplicated() {
    let records = parse_document(KNOWLEDGE_BASE.as_bytes()).unwrap();
    let converter = Converter::new(ConversionConfig::default());
    let (rows, summary) = converter.flatten_records(&records).unwrap();

    let amplification: Vec<_> = rows
        .iter()
        .filter(|r| r.evidence_source == "PubMed:2")
        .collect();
    // One row per specimen for the component evidence, the record tag spliced
    // onto the first.
    assert_eq!(amplification.len(), 2);
    assert_eq!(amplification[0].tag, "biomarker;assessed_biomarker_entity;condition");
    assert_eq!(amplification[1].tag, "biomarker;assessed_biomarker_entity");
    assert_eq!(amplification[0].evidence, "EGFR amplification;|n=120; p<0.01");
    assert_eq!(summary.spliced, 1);

    let risk: Vec<_> = rows.iter().filter(|r| r.evidence_source == "PubMed:3").collect();
    assert_eq!(risk.len(), 1);
}

/// Record evidence scoped to blood shares its source and text with
/// component evidence written on a tissue row of another component.
const SHARED_EVIDENCE: &str = r#"[
  {
    "biomarker_id": "AA0001",
    "biomarker_component": [
      {
        "biomarker": "increased level of EGFR",
        "assessed_biomarker_entity": { "recommended_name": "EGFR", "synonyms": [] },
        "assessed_biomarker_entity_id": "HGNC:3236",
        "assessed_entity_type": "gene",
        "specimen": [
          { "name": "tissue", "id": "UBERON:0000479", "name_space": "Uberon", "url": "", "loinc_code": "" }
        ],
        "evidence_source": [
          {
            "id": "1",
            "database": "PubMed",
            "evidence_list": [{ "evidence": "elevated" }],
            "tags": [{ "tag": "biomarker" }]
          }
        ]
      },
      {
        "biomarker": "increased level of KRAS",
        "assessed_biomarker_entity": { "recommended_name": "KRAS", "synonyms": [] },
        "assessed_biomarker_entity_id": "HGNC:6407",
        "assessed_entity_type": "gene",
        "specimen": [
          { "name": "blood", "id": "UBERON:0000178", "name_space": "Uberon", "url": "", "loinc_code": "" }
        ],
        "evidence_source": []
      }
    ],
    "best_biomarker_role": [{ "role": "diagnostic" }],
    "evidence_source": [
      {
        "id": "1",
        "database": "PubMed",
        "evidence_list": [{ "evidence": "elevated" }],
        "tags": [{ "tag": "specimen:UBERON:0000178" }]
      }
    ],
    "citation": []
  }
]"#;

#[test]
fn test_shared_record_evidence_keeps_specimen_scope() {
    let records = parse_document(SHARED_EVIDENCE.as_bytes()).unwrap();
    let mut converter = Converter::new(ConversionConfig::default());
    let (rows, _) = converter.flatten_records(&records).unwrap();

    for row in &rows {
        if row.tag_tokens().any(|t| t == "specimen:UBERON:0000178") {
            assert_eq!(row.specimen_id, "UBERON:0000178", "tag on wrong row: {:?}", row);
        }
    }
    let tissue = rows.iter().find(|r| r.specimen == "tissue").unwrap();
    assert_eq!(tissue.tag, "biomarker");
    let blood = rows.iter().find(|r| r.specimen == "blood").unwrap();
    assert_eq!(blood.evidence_source, "PubMed:1");
    assert_eq!(blood.tag, "specimen:UBERON:0000178");

    let (rebuilt, summary) = converter.rebuild_rows(&rows).unwrap();
    assert!(
        summary.warnings.iter().all(|w| w.kind != WarningKind::UnmatchedObjectTag),
        "evidence dropped: {:?}",
        summary.warnings
    );

    let kras = rebuilt[0]
        .biomarker_component
        .iter()
        .find(|c| c.assessed_biomarker_entity_id == "HGNC:6407")
        .unwrap();
    assert_eq!(kras.evidence_source.len(), 1);
    assert!(kras.evidence_source[0].has_tag("specimen:UBERON:0000178"));
}

#[test]
fn test_every_specimen_has_a_row() {
    let records = parse_document(KNOWLEDGE_BASE.as_bytes()).unwrap();
    let converter = Converter::new(ConversionConfig::default());
    let (rows, _) = converter.flatten_records(&records).unwrap();

    for record in &records {
        for component in &record.biomarker_component {
            for specimen in &component.specimen {
                assert!(
                    rows.iter().any(|r| r.biomarker_id == record.biomarker_id
                        && r.specimen == specimen.name
                        && r.specimen_id == specimen.id
                        && r.loinc_code == specimen.loinc_code),
                    "no row for specimen {:?}",
                    specimen
                );
            }
        }
    }
}

#[test]
fn test_chunk_size_does_not_change_output() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("kb.json");
    fs::write(&source, KNOWLEDGE_BASE).unwrap();

    let small = dir.path().join("small.tsv");
    let large = dir.path().join("large.tsv");
    Converter::new(ConversionConfig::default().with_chunk_size(1))
        .convert(&source, &small)
        .unwrap();
    Converter::new(ConversionConfig::default())
        .convert(&source, &large)
        .unwrap();

    assert_eq!(fs::read_to_string(&small).unwrap(), fs::read_to_string(&large).unwrap());
}

#[test]
fn test_missing_entity_id_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("bad.json");
    let target = dir.path().join("bad.tsv");
    fs::write(&source, AA0001_EXAMPLE.replace("HGNC:3236", "")).unwrap();

    let result = Converter::new(ConversionConfig::default()).convert(&source, &target);
    assert!(matches!(result, Err(ConversionError::MissingField { .. })));
    assert!(!target.exists());
}

// =============================================================================
// Rebuild Tests
// =============================================================================

#[test]
fn test_evidence_dedup_unions_tags() {
    let content = format!(
        "{}\n\
         AA0001\tincreased level of EGFR\tEGFR\tHGNC:3236\tgene\t\t\t\t\tdiagnostic\tblood\tUBERON:0000178\t\tPubMed:1\televated\tbiomarker\n\
         AA0001\tincreased level of EGFR\tEGFR\tHGNC:3236\tgene\t\t\t\t\tdiagnostic\tblood\tUBERON:0000178\t\tPubMed:1\televated\tspecimen:UBERON:0000178;assessed_entity_type\n",
        header()
    );
    let source = create_test_file(&content, ".tsv");
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.json");

    let report = Converter::new(ConversionConfig::default())
        .convert(source.path(), &target)
        .unwrap();
    assert_eq!(report.direction, Direction::Rebuild);
    assert_eq!(report.rows, 2);

    let records = load_document(&target).unwrap();
    let evidence = &records[0].biomarker_component[0].evidence_source;
    assert_eq!(evidence.len(), 1);
    let tags: Vec<&str> = evidence[0].tag_tokens().collect();
    assert_eq!(tags, vec!["biomarker", "specimen:UBERON:0000178", "assessed_entity_type"]);
}

#[test]
fn test_renamed_header_aborts_before_output() {
    let content = format!(
        "{}\nAA0001\tb\tEGFR\tHGNC:3236\tgene\t\t\t\t\t\t\t\t\t\t\t\n",
        header().replace("evidence_source", "source")
    );
    let source = create_test_file(&content, ".tsv");
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.json");

    let result = Converter::new(ConversionConfig::default()).convert(source.path(), &target);
    assert!(matches!(result, Err(ConversionError::UnexpectedHeader(h)) if h == "source"));
    assert!(!target.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_required_cell_reports_row() {
    let content = format!(
        "{}\n\
         AA0001\tb\tEGFR\tHGNC:3236\tgene\t\t\t\t\t\t\t\t\t\t\t\n\
         AA0002\tb\tTP53\t\tgene\t\t\t\t\t\t\t\t\t\t\t\n",
        header()
    );
    let source = create_test_file(&content, ".tsv");
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.json");

    let err = Converter::new(ConversionConfig::default())
        .convert(source.path(), &target)
        .unwrap_err();
    assert!(err.to_string().contains("row 2"), "unexpected error: {}", err);
    assert!(!target.exists());
}

#[test]
fn test_unrecognized_tag_is_reported_not_fatal() {
    let content = format!(
        "{}\nAA0001\tb\tEGFR\tHGNC:3236\tgene\t\t\t\t\t\t\t\t\tPubMed:1\tx\tbiomarker;evidence\n",
        header()
    );
    let source = create_test_file(&content, ".tsv");
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.json");

    let report = Converter::new(ConversionConfig::default())
        .convert(source.path(), &target)
        .unwrap();
    assert_eq!(report.warning_counts().get(&WarningKind::UnrecognizedTag), Some(&1));
    assert!(target.exists());
}

#[test]
fn test_nt_target_rejected() {
    let source = create_test_file(AA0001_EXAMPLE, ".json");
    let result = Converter::new(ConversionConfig::default()).convert(source.path(), "out.nt");
    assert!(matches!(result, Err(ConversionError::UnsupportedConversion(_))));
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_round_trip_recovers_document() {
    let dir = TempDir::new().unwrap();
    let original = parse_document(KNOWLEDGE_BASE.as_bytes()).unwrap();
    let (_, rebuilt) = round_trip(&dir, KNOWLEDGE_BASE, "kb");

    let original = normalize(original);
    let rebuilt = normalize(rebuilt);
    assert_eq!(rebuilt.len(), original.len());

    for (a, b) in original.iter().zip(&rebuilt) {
        assert_eq!(a.biomarker_id, b.biomarker_id);
        assert_eq!(a.best_biomarker_role, b.best_biomarker_role);
        assert_eq!(a.condition_columns(), b.condition_columns());
        assert_eq!(a.exposure_agent_columns(), b.exposure_agent_columns());
        assert_eq!(a.biomarker_component.len(), b.biomarker_component.len());

        let evidence_of = |r: &BiomarkerRecord| {
            r.evidence_source
                .iter()
                .map(|e| (e.source_label(), e.evidence_list.clone(), e.tags.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(evidence_of(a), evidence_of(b));

        for (ca, cb) in a.biomarker_component.iter().zip(&b.biomarker_component) {
            assert_eq!(ca.key(), cb.key());
            let specimens_a: Vec<_> = ca.specimen.iter().map(|s| s.key()).collect();
            let specimens_b: Vec<_> = cb.specimen.iter().map(|s| s.key()).collect();
            assert_eq!(specimens_a, specimens_b);

            let ev_a: Vec<_> = ca
                .evidence_source
                .iter()
                .map(|e| (e.source_label(), e.evidence_list.clone(), e.tags.clone()))
                .collect();
            let ev_b: Vec<_> = cb
                .evidence_source
                .iter()
                .map(|e| (e.source_label(), e.evidence_list.clone(), e.tags.clone()))
                .collect();
            assert_eq!(ev_a, ev_b);
        }
    }
}

#[test]
fn test_round_trip_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (rows_first, rebuilt_first) = round_trip(&dir, KNOWLEDGE_BASE, "first");

    let json = serde_json::to_string_pretty(&rebuilt_first).unwrap();
    let (rows_second, rebuilt_second) = round_trip(&dir, &json, "second");

    assert_eq!(normalize(rebuilt_first), normalize(rebuilt_second));
    assert_eq!(sorted_rows(rows_first), sorted_rows(rows_second));
}

#[test]
fn test_rebuilt_document_carries_urls() {
    let dir = TempDir::new().unwrap();
    let (_, rebuilt) = round_trip(&dir, KNOWLEDGE_BASE, "urls");

    let record = rebuilt.iter().find(|r| r.biomarker_id == "AA0001").unwrap();
    let blood = &record.biomarker_component[0].specimen[0];
    assert_eq!(blood.name_space, "Uberon");
    assert_eq!(blood.url, "http://purl.obolibrary.org/obo/UBERON_0000178");

    let condition = record.condition.as_ref().unwrap();
    assert_eq!(condition.recommended_name.resource, "Disease Ontology");

    let evidence = &record.biomarker_component[0].evidence_source[0];
    assert_eq!(evidence.url.as_deref(), Some("https://pubmed.ncbi.nlm.nih.gov/1"));
}

// =============================================================================
// Configuration and Enrichment Tests
// =============================================================================

const EGFR_ROW: &str = "AA0001\tincreased level of EGFR\tEGFR\tHGNC:3236\tgene\tlung cancer\tDOID:1324\t\t\tdiagnostic\tblood\tUBERON:0000178\t\tPubMed:1\televated\tbiomarker;condition";

#[test]
fn test_config_file_overrides_url_map() {
    let config_file = create_test_file(
        r#"{ "chunk_size": 1, "url_map": { "uberon": "https://example.org/uberon/" } }"#,
        ".json",
    );
    let config = ConversionConfig::load(config_file.path()).unwrap();
    assert_eq!(config.chunk_size, 1);
    // Built-in entries not named in the file are kept.
    assert!(config.url_map.contains_key("pubmed"));

    let source = create_test_file(&format!("{}\n{}\n", header(), EGFR_ROW), ".tsv");
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.json");
    Converter::new(config).convert(source.path(), &target).unwrap();

    let records = load_document(&target).unwrap();
    let specimen = &records[0].biomarker_component[0].specimen[0];
    assert_eq!(specimen.url, "https://example.org/uberon/0000178");
}

#[test]
fn test_invalid_config_file() {
    let config_file = create_test_file(r#"{ "chunk_size": 0 }"#, ".json");
    assert!(matches!(
        ConversionConfig::load(config_file.path()),
        Err(ConversionError::Config(_))
    ));
}

#[test]
fn test_metadata_cache_file_reused_across_runs() {
    let dir = TempDir::new().unwrap();
    let cache_path = dir.path().join("metadata_cache.json");
    let source = create_test_file(&format!("{}\n{}\n", header(), EGFR_ROW), ".tsv");
    let config = ConversionConfig::default().with_metadata(true);

    let lookup = MockLookup::new()
        .with_entity(
            "hgnc",
            "3236",
            EntityMetadata {
                recommended_name: "EGFR".to_string(),
                synonyms: vec!["ERBB1".to_string(), "HER1".to_string()],
            },
        )
        .with_citation(
            "1",
            CitationMetadata {
                title: "EGFR in blood".to_string(),
                journal: "J Biomark".to_string(),
                authors: "Doe J".to_string(),
                publication_date: "2020".to_string(),
            },
        );
    let first = dir.path().join("first.json");
    Converter::new(config.clone())
        .with_lookup(CachedLookup::new(lookup, JsonFileCache::open(&cache_path).unwrap()))
        .convert(source.path(), &first)
        .unwrap();

    assert!(cache_path.exists());
    let cached = fs::read_to_string(&cache_path).unwrap();
    assert!(cached.contains("entity:hgnc:3236"));
    assert!(cached.contains("citation:pubmed:1"));

    // The second run has no live lookup and is served from the cache file.
    let second = dir.path().join("second.json");
    Converter::new(config)
        .with_lookup(CachedLookup::new(OfflineLookup, JsonFileCache::open(&cache_path).unwrap()))
        .convert(source.path(), &second)
        .unwrap();

    for path in [&first, &second] {
        let records = load_document(path).unwrap();
        let synonyms: Vec<&str> = records[0].biomarker_component[0]
            .assessed_biomarker_entity
            .synonyms
            .iter()
            .map(|s| s.synonym.as_str())
            .collect();
        assert_eq!(synonyms, vec!["ERBB1", "HER1"]);
        assert_eq!(records[0].citation.len(), 1);
        assert_eq!(records[0].citation[0].title, "EGFR in blood");
        assert_eq!(records[0].citation[0].reference[0].id, "1");
    }
}

#[test]
fn test_metadata_off_skips_lookup() {
    let source = create_test_file(&format!("{}\n{}\n", header(), EGFR_ROW), ".tsv");
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("out.json");

    let report = Converter::new(ConversionConfig::default())
        .with_lookup(OfflineLookup)
        .convert(source.path(), &target)
        .unwrap();

    assert!(report.warnings.is_empty());
    let records = load_document(&target).unwrap();
    assert!(records[0].citation.is_empty());
    assert!(records[0].biomarker_component[0]
        .assessed_biomarker_entity
        .synonyms
        .is_empty());
}
