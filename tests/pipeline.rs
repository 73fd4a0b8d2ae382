use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use osm_pbf_parallel::{Error, Pipeline, Result};

#[test]
fn concurrency_never_exceeds_the_permit_count() {
    let pipeline = Pipeline::new(8, 3).unwrap();
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pipeline
                .submit(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok(i)
                })
                .unwrap()
        })
        .collect();

    let results: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, (0..32).collect::<Vec<_>>());
    assert!(peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(pipeline.permits().available(), 3);
}

#[test]
fn submission_blocks_until_a_permit_is_released() {
    let pipeline = Arc::new(Pipeline::new(2, 1).unwrap());
    let (release, gate) = mpsc::channel::<()>();
    let first = pipeline
        .submit(move || {
            gate.recv().ok();
            Ok(1)
        })
        .unwrap();

    let (submitted_tx, submitted) = mpsc::channel();
    let submitter = {
        let pipeline = Arc::clone(&pipeline);
        thread::spawn(move || {
            let handle = pipeline.submit(|| Ok(2));
            submitted_tx.send(()).unwrap();
            handle.and_then(|h| h.join())
        })
    };

    assert!(submitted.recv_timeout(Duration::from_millis(100)).is_err());
    release.send(()).unwrap();
    submitted.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(first.join().unwrap(), 1);
    assert_eq!(submitter.join().unwrap().unwrap(), 2);
}

#[test]
fn faults_do_not_starve_the_pool() {
    let pipeline = Pipeline::new(2, 2).unwrap();
    for round in 0..10 {
        let failing = pipeline
            .submit(|| -> Result<()> { Err(Error::MalformedBlock("broken")) })
            .unwrap();
        let panicking = pipeline
            .submit(move || -> Result<()> { panic!("round {round}") })
            .unwrap();
        assert!(matches!(failing.join(), Err(Error::MalformedBlock(_))));
        assert!(matches!(panicking.join(), Err(Error::WorkerPanicked(m)) if m == format!("round {round}")));
    }
    assert_eq!(pipeline.permits().available(), 2);
}

#[test]
fn closing_rejects_new_work() {
    let pipeline = Pipeline::new(1, 1).unwrap();
    pipeline.permits().close();
    assert!(matches!(
        pipeline.submit(|| Ok(())),
        Err(Error::PipelineClosed)
    ));
}
