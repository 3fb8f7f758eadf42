// Integration tests for the annotation pipeline with the bundled components
use std::path::{Path, PathBuf};

use umls_ner::identifier::SequentialIdGenerator;
use umls_ner::linker::{KnowledgeBase, KnowledgeBaseLinker, LinkerConfig};
use umls_ner::normalizer::TrueCaser;
use umls_ner::output::{output_path, write_tsv};
use umls_ner::recognizer::GazetteerRecognizer;
use umls_ner::source::{DelimitedTableSource, LineFileSource};
use umls_ner::{
    AnnotationError, AnnotationPipeline, EntityRecognizer, EntityTable, LinkedEntity,
    SemanticTypeTable,
};

type DemoPipeline = AnnotationPipeline<TrueCaser, GazetteerRecognizer, KnowledgeBaseLinker>;

fn demo_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/demo").join(name)
}

fn demo_linker() -> KnowledgeBaseLinker {
    let kb = KnowledgeBase::from_path(demo_path("kb.jsonl")).unwrap();
    KnowledgeBaseLinker::new(kb, LinkerConfig::default())
}

fn demo_pipeline() -> DemoPipeline {
    AnnotationPipeline::new(
        TrueCaser::from_path(demo_path("casing.json")).unwrap(),
        GazetteerRecognizer::from_path(demo_path("lexicon.json")).unwrap(),
        demo_linker(),
        SemanticTypeTable::bundled().unwrap(),
    )
    .with_id_generator(SequentialIdGenerator::new("doc"))
}

fn cuis(records: &[LinkedEntity]) -> Vec<&str> {
    records.iter().map(|r| r.umls_cui.as_str()).collect()
}

#[tokio::test]
async fn test_diabetes_scenario() {
    let pipeline = demo_pipeline();
    let records = pipeline.extract("Patient has diabetes.", Some("p1"), false).await.unwrap();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.input_id, "p1");
    assert_eq!(record.input_text, "Patient has diabetes.");
    assert_eq!(record.entity, "diabetes");
    assert_eq!(record.entity_type, "DISEASE");
    assert_eq!(record.umls_cui, "C0011849");
    assert_eq!(record.umls_label, "Diabetes Mellitus");
    assert_eq!(record.umls_semantic_type_ids, "T047");
    assert_eq!(record.umls_semantic_type_labels, "Disease or Syndrome");
    assert_eq!(record.umls_synonyms, "Diabetes, DM, Diabetes mellitus disorder");
    assert_eq!(record.umls_mapping_score, Some(1.0));
    assert_eq!(record.score_text(), "1.0");
}

#[tokio::test]
async fn test_abbreviations_link_through_long_form() {
    let pipeline = demo_pipeline();
    let text = "chronic kidney disease (CKD) with hypertension. CKD stage 3.";
    let records = pipeline.extract(text, Some("ckd"), false).await.unwrap();

    let entities: Vec<&str> = records.iter().map(|r| r.entity.as_str()).collect();
    assert_eq!(entities, vec!["Chronic kidney disease", "CKD", "hypertension", "CKD"]);
    assert_eq!(cuis(&records), vec!["C1561643", "C1561643", "C0020538", "C1561643"]);
    assert!(records.iter().all(|r| r.input_text == text));
}

#[tokio::test]
async fn test_case_expanding_characters_near_abbreviation() {
    let pipeline = demo_pipeline();
    let records = pipeline
        .extract("asthma. İİİİİİ ab (AB) rose.", Some("x"), false)
        .await
        .unwrap();

    assert_eq!(cuis(&records), vec!["C0004096"]);
}

#[tokio::test]
async fn test_multiple_semantic_types() {
    let pipeline = demo_pipeline();
    let records = pipeline.extract("Started on aspirin.", None, false).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].umls_semantic_type_ids, "T109,T121");
    assert_eq!(
        records[0].umls_semantic_type_labels,
        "Organic Chemical,Pharmacologic Substance"
    );
    assert_eq!(records[0].input_id, "doc-1");
}

#[tokio::test]
async fn test_unlinked_entities() {
    let pipeline = demo_pipeline();
    let text = "Biopsy showed glomerulosclerosis.";

    assert!(pipeline.extract(text, None, false).await.unwrap().is_empty());

    let records = pipeline.extract(text, None, true).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].entity, "glomerulosclerosis");
    assert!(!records[0].is_linked());
    assert_eq!(records[0].to_row()[4..].concat(), "");
}

#[tokio::test]
async fn test_several_candidates_per_mention() {
    let config = LinkerConfig {
        max_entities_per_mention: 3,
        ..LinkerConfig::default()
    };
    let kb = KnowledgeBase::from_path(demo_path("kb.jsonl")).unwrap();
    let pipeline = AnnotationPipeline::new(
        TrueCaser::default(),
        GazetteerRecognizer::from_path(demo_path("lexicon.json")).unwrap(),
        KnowledgeBaseLinker::new(kb, config),
        SemanticTypeTable::bundled().unwrap(),
    );

    let records = pipeline
        .extract("History of type 2 diabetes mellitus.", Some("t2"), false)
        .await
        .unwrap();

    assert!(!records.is_empty());
    assert_eq!(records[0].umls_cui, "C0011860");
    assert!(records.iter().all(|r| r.entity == "type 2 diabetes mellitus"));
    assert!(records
        .windows(2)
        .all(|w| w[0].umls_mapping_score >= w[1].umls_mapping_score));
}

#[tokio::test]
async fn test_empty_lexicon_is_unavailable() {
    let pipeline = AnnotationPipeline::new(
        TrueCaser::default(),
        GazetteerRecognizer::new("empty", Vec::new()),
        demo_linker(),
        SemanticTypeTable::bundled().unwrap(),
    );

    let result = pipeline.extract("Patient has diabetes.", None, false).await;
    assert!(matches!(result, Err(AnnotationError::ModelUnavailable(_))));
}

#[tokio::test]
async fn test_table_batch_to_tsv() {
    let pipeline = demo_pipeline();
    let input = demo_path("notes.tsv");
    let source = DelimitedTableSource::new(&input, "text").with_id_column("note_id");

    let (records, stats) = pipeline.extract_from_source(&source, false, None).await.unwrap();

    assert_eq!(stats.inputs, 4);
    assert_eq!(stats.with_entities, 3);
    assert_eq!(stats.records, records.len());

    let ids: Vec<&str> = records.iter().map(|r| r.input_id.as_str()).collect();
    assert_eq!(ids, vec!["n1", "n3", "n3", "n3", "n3", "n5", "n5", "n5"]);
    assert_eq!(
        cuis(&records[5..]),
        vec!["C0015967", "C0010200", "C0004057"]
    );

    let dir = tempfile::tempdir().unwrap();
    let path = output_path(dir.path(), pipeline.recognizer().model_name(), &input);
    assert!(path.ends_with("scispacy_ner/model_en_demo/notes.tsv_entities.tsv"));

    write_tsv(&path, &EntityTable::from(records)).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next().unwrap(), LinkedEntity::COLUMNS.join("\t"));
    assert_eq!(lines.count(), 8);
}

#[tokio::test]
async fn test_line_file_batch_generates_ids() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("abstracts.txt");
    std::fs::write(&input, "Asthma in children.\n\nMetformin lowers glucose.\n").unwrap();

    let pipeline = demo_pipeline();
    let source = LineFileSource::new(&input);
    let (records, stats) = pipeline.extract_from_source(&source, false, None).await.unwrap();

    assert_eq!(stats.inputs, 2);
    assert_eq!(cuis(&records), vec!["C0004096", "C0025598"]);
    assert_eq!(records[0].input_id, "doc-1");
    assert_eq!(records[1].input_id, "doc-2");
}
