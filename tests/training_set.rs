use std::io::Write;

use tempfile::NamedTempFile;

use rust_nn_trainer::network;
use rust_nn_trainer::{
    Error, LearnOptions, Network, Operation, QUALITATIVE_BANKRUPTCY, Screen, Session, TrainingSet,
};

const HEADER: &str = "industrial_risk,management_risk,financial_flexibility,credibility,competitiveness,operating_risk,class";

fn write_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for row in rows {
        writeln!(file, "{row}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn rows(len: usize) -> Vec<&'static str> {
    (0..len)
        .map(|i| if i % 2 == 0 { "P,P,A,A,A,P,NB" } else { "N,N,A,N,N,N,B" })
        .collect()
}

#[test]
fn load_reads_file_and_splits() {
    let file = write_csv(&rows(10));
    let mut set = TrainingSet::new(QUALITATIVE_BANKRUPTCY);

    set.load(file.path(), 25.0).unwrap();

    assert!(set.is_loaded());
    assert!(!set.is_normalized());
    assert_eq!(set.len(), 10);
    assert_eq!(set.training_instance_count(), 8);
    assert_eq!(set.testing().len(), 2);
    assert_eq!(set.instances()[0].attributes, vec![2.0, 2.0, 1.0, 1.0, 1.0, 2.0]);
    assert_eq!(set.instances()[0].classification, 1.0);
    assert_eq!(set.instances()[1].classification, 0.0);
}

#[test]
fn try_load_reports_failures_as_false() {
    let mut set = TrainingSet::new(QUALITATIVE_BANKRUPTCY);

    let dir = tempfile::tempdir().unwrap();
    assert!(!set.try_load(dir.path().join("missing.csv"), 20.0));
    assert!(!set.is_loaded());

    let bad = write_csv(&["P,P,A,A,A,X,NB"]);
    assert!(!set.try_load(bad.path(), 20.0));
    assert!(!set.is_loaded());

    let good = write_csv(&rows(5));
    assert!(set.try_load(good.path(), 20.0));
    assert_eq!(set.len(), 5);

    assert!(!set.try_load(bad.path(), 20.0));
    assert_eq!(set.len(), 5);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut set = TrainingSet::new(QUALITATIVE_BANKRUPTCY);
    let err = set.load(dir.path().join("missing.csv"), 20.0).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn session_loads_shuffles_and_normalizes() {
    let file = write_csv(&rows(20));
    let mut session = Session::new(
        Network::new(6, 1).unwrap(),
        TrainingSet::new(QUALITATIVE_BANKRUPTCY),
    );

    session.load_training_set(file.path(), 20.0).unwrap();

    let set = session.learn().training_set();
    assert!(set.is_normalized());
    assert_eq!(set.len(), 20);
    assert!(set
        .instances()
        .iter()
        .flat_map(|i| &i.attributes)
        .all(|v| (0.0..=1.0).contains(v)));

    let bad = write_csv(&["P,P,A,A,A,P,maybe"]);
    assert!(session.load_training_set(bad.path(), 20.0).is_err());
    assert_eq!(session.learn().training_set().len(), 20);
}

#[test]
fn failed_session_load_keeps_progress() {
    let file = write_csv(&rows(20));
    let mut session = Session::new(
        Network::new(6, 1).unwrap(),
        TrainingSet::new(QUALITATIVE_BANKRUPTCY),
    );
    session.load_training_set(file.path(), 20.0).unwrap();
    assert!(session
        .learning_setup(&[3], LearnOptions::default())
        .unwrap());

    let shared = session.network().clone();
    for _ in 0..3 {
        session
            .learn_mut()
            .update(&mut network::lock(&shared))
            .unwrap();
    }
    session.learning_process(Operation::Test).unwrap();
    let tested = session.tests().len();
    assert_eq!(tested, 4);

    let bad = write_csv(&["P,P,A,A,A,P,maybe"]);
    assert!(session.load_training_set(bad.path(), 20.0).is_err());
    assert_eq!(session.learn().step_index(), 3);
    assert_eq!(session.tests().len(), tested);
    assert_eq!(session.screen(), Screen::Testing);

    session.load_training_set(file.path(), 20.0).unwrap();
    assert_eq!(session.learn().step_index(), 0);
    assert!(session.tests().is_empty());
    assert_eq!(session.screen(), Screen::Setup);
}
