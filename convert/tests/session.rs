mod common;

use std::sync::Arc;

use common::{ToneFactory, settings, write_checkpoint, write_input};
use rvc_convert::{ModelId, Session};

#[test]
fn models_stay_resident() {
    let dir = tempfile::tempdir().unwrap();
    write_checkpoint(dir.path(), ModelId::Tsukuyomi, 256, 1);
    let input = write_input(dir.path(), "in.wav", 200.0, 0.5);

    let factory = Arc::new(ToneFactory::default());
    let session = Session::with_factory(settings(dir.path()), factory.clone());
    for i in 0..3 {
        let out = dir.path().join(format!("out{i}.wav"));
        session.convert(&input, "tsukuyomi", &out, i as f32).unwrap();
        assert!(out.exists());
    }
    assert_eq!(factory.created(), 1);
    assert_eq!(session.resident(), vec![ModelId::Tsukuyomi]);

    assert!(session.evict(ModelId::Tsukuyomi));
    assert!(!session.evict(ModelId::Tsukuyomi));
    session
        .convert(&input, "tsukuyomi", dir.path().join("again.wav"), 0.0)
        .unwrap();
    assert_eq!(factory.created(), 2);
    session.close();
}

#[test]
fn distinct_models_in_parallel() {
    let dir = tempfile::tempdir().unwrap();
    write_checkpoint(dir.path(), ModelId::Tsukuyomi, 256, 1);
    write_checkpoint(dir.path(), ModelId::Amitaro, 768, 0);
    let input = write_input(dir.path(), "in.wav", 180.0, 0.5);

    let factory = Arc::new(ToneFactory::default());
    let session = Session::with_factory(settings(dir.path()), factory.clone());

    std::thread::scope(|s| {
        for (i, model) in ["tsukuyomi", "amitaro", "tsukuyomi", "amitaro"].iter().enumerate() {
            let session = &session;
            let input = &input;
            let out = dir.path().join(format!("par{i}.wav"));
            s.spawn(move || {
                let result = session.convert(input, model, &out, 0.0).unwrap();
                assert_eq!(result.sample_rate, 40000);
            });
        }
    });

    assert_eq!(factory.created(), 2);
    assert_eq!(session.resident(), vec![ModelId::Tsukuyomi, ModelId::Amitaro]);
    session.close();
}

#[test]
fn failed_load_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "in.wav", 200.0, 0.5);
    let factory = Arc::new(ToneFactory::default());
    let session = Session::with_factory(settings(dir.path()), factory.clone());

    assert!(session.convert(&input, "amitaro", dir.path().join("a.wav"), 0.0).is_err());
    assert!(session.resident().is_empty());

    write_checkpoint(dir.path(), ModelId::Amitaro, 256, 1);
    session.convert(&input, "amitaro", dir.path().join("b.wav"), 0.0).unwrap();
    assert_eq!(session.resident(), vec![ModelId::Amitaro]);
}
