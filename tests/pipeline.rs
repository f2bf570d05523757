//! End-to-end runs of the stage library paths on a synthetic diabetes dataset.

use std::path::{Path, PathBuf};

use mlstage::config::PipelineConfig;
use mlstage::dataset::features::{default_columns, engineer_features};
use mlstage::dataset::split::{SplitOptions, split_dataset};
use mlstage::dataset::{self, Table, write_csv};
use mlstage::ml::gbdt_stump::{MODEL_FILE_NAME, TrainDataset, TrainOptions, train_gbdt_stump};
use mlstage::ml::metrics::MetricsRecord;
use mlstage::registry::FsModelRegistry;
use mlstage::scoring::{FEATURE_ORDER, ScoringContext};
use mlstage::stages::evaluate::{EvaluateRequest, run_evaluation};
use mlstage::stages::register::{RegisterOutcome, RegisterRequest, run_registration};
use mlstage::stages::select::{ComparisonReport, Constraint, compare_models};
use serde_json::Value;
use tempfile::tempdir;

const ROWS: usize = 120;

fn diabetes_table() -> Table {
    let mut headers: Vec<String> = FEATURE_ORDER.iter().map(|s| s.to_string()).collect();
    headers.push("Outcome".to_string());
    let mut table = Table::new(headers);
    for i in 0..ROWS {
        let glucose = 60 + (i * 37) % 140;
        let outcome = u8::from(glucose > 125);
        table.rows.push(vec![
            (i % 9).to_string(),
            glucose.to_string(),
            (50 + (i * 13) % 40).to_string(),
            (10 + (i * 7) % 30).to_string(),
            (i * 11 % 200).to_string(),
            format!("{:.1}", 18.0 + (i * 3 % 25) as f64),
            format!("{:.3}", (i % 20) as f64 / 20.0),
            (21 + i % 50).to_string(),
            outcome.to_string(),
        ]);
    }
    table
}

struct Pipeline {
    _dir: tempfile::TempDir,
    root: PathBuf,
    model_dir: PathBuf,
    test_dir: PathBuf,
}

/// Features, split and train; returns the trained model location.
fn prepare() -> Pipeline {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    write_csv(&root.join("raw/diabetes.csv"), &diabetes_table()).unwrap();

    let transformed =
        engineer_features(&root.join("raw"), &root.join("features"), &default_columns()).unwrap();
    let train_dir = root.join("train");
    let test_dir = root.join("test");
    let outputs = split_dataset(&transformed, &train_dir, &test_dir, &SplitOptions::default())
        .unwrap();
    assert_eq!(outputs.train_rows, 84);
    assert_eq!(outputs.train_rows + outputs.test_rows, ROWS);

    let table = dataset::load_tables(&train_dir).unwrap();
    let label = PipelineConfig::default().train.label;
    let train = TrainDataset::from_table(&table, &label).unwrap();
    assert_eq!(train.feature_names, FEATURE_ORDER.to_vec());
    let model = train_gbdt_stump(&train, &TrainOptions::default()).unwrap();
    let model_dir = root.join("model");
    model.save_json(&model_dir.join(MODEL_FILE_NAME)).unwrap();

    Pipeline {
        _dir: dir,
        root,
        model_dir,
        test_dir,
    }
}

fn evaluate(pipeline: &Pipeline, model_id: &str, model_path: &Path) -> MetricsRecord {
    let request = EvaluateRequest {
        model_id: model_id.to_string(),
        model_path: model_path.to_path_buf(),
        test_data: pipeline.test_dir.clone(),
        label_column: "Outcome".to_string(),
        positive_label: "1".to_string(),
    };
    let output = pipeline.root.join("metrics").join(format!("{model_id}.json"));
    run_evaluation(&request, &output).unwrap()
}

#[test]
fn trained_model_wins_and_is_registered_then_scored() {
    let pipeline = prepare();
    let trained = evaluate(&pipeline, "trained", &pipeline.model_dir);
    assert!(trained.accuracy > 0.8, "accuracy {}", trained.accuracy);
    assert!(trained.f1_score > 0.0);

    let missing = evaluate(&pipeline, "existing", &pipeline.root.join("no-such-model"));
    assert_eq!(missing, MetricsRecord::zero());

    let report_path = pipeline.root.join("comparison_report.json");
    let report = compare_models(
        &[pipeline.root.join("metrics")],
        Constraint::MaximizeF1,
        &report_path,
    )
    .unwrap();
    assert_eq!(report.best_model_id, "trained");
    assert_eq!(report.models.len(), 2);
    assert_eq!(ComparisonReport::load(&report_path).unwrap(), report);

    let registry_root = pipeline.root.join("registry");
    let mut registry = FsModelRegistry::new(&registry_root);
    let request = RegisterRequest {
        comparison_report: report_path,
        model_path: pipeline.model_dir.clone(),
        model_name: "diabetes_model".to_string(),
        model_id: "trained".to_string(),
    };
    let log_path = pipeline.root.join("register_report.txt");
    let version_path = pipeline.root.join("outputs/model_version");
    let outcome =
        run_registration(&request, &mut registry, &log_path, Some(&version_path)).unwrap();
    assert_eq!(outcome, RegisterOutcome::Registered { version: 1 });
    assert!(
        std::fs::read_to_string(&log_path)
            .unwrap()
            .contains("registration complete")
    );
    assert_eq!(std::fs::read_to_string(&version_path).unwrap(), "1");

    let context =
        ScoringContext::from_model_dir(&registry.version_dir("diabetes_model", 1), &[]).unwrap();
    let response: Value = serde_json::from_str(&context.run(
        r#"{"Pregnancies": 2, "Glucose": 0.9, "BloodPressure": 0.5, "SkinThickness": 0.4,
            "Insulin": 0.2, "BMI": 0.3, "DiabetesPedigreeFunction": 0.5, "Age": 30}"#,
    ))
    .unwrap();
    let fields = response.as_object().unwrap();
    assert_eq!(fields.len(), 4, "{response}");
    assert_eq!(fields["model_name"], "diabetes_model");
    assert_eq!(fields["model_version"], "1");
    let label = fields["predicted_class"].as_str().unwrap();
    assert!(label == "Diabetes" || label == "No Diabetes");
}

#[test]
fn losing_model_is_not_registered() {
    let pipeline = prepare();
    let report_path = pipeline.root.join("comparison_report.json");
    std::fs::write(&report_path, r#"{"models": [], "best_model": "existing"}"#).unwrap();

    let registry_root = pipeline.root.join("registry");
    let mut registry = FsModelRegistry::new(&registry_root);
    let request = RegisterRequest {
        comparison_report: report_path,
        model_path: pipeline.model_dir.clone(),
        model_name: "diabetes_model".to_string(),
        model_id: "trained".to_string(),
    };
    let log_path = pipeline.root.join("register_report.txt");
    let outcome = run_registration(&request, &mut registry, &log_path, None).unwrap();
    assert!(matches!(outcome, RegisterOutcome::NotBest { .. }));
    assert_eq!(registry.latest_version("diabetes_model").unwrap(), None);
    assert!(
        std::fs::read_to_string(&log_path)
            .unwrap()
            .contains("registration aborted")
    );
}
