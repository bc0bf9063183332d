use std::collections::HashSet;
use std::sync::Arc;

use callkey::cache::{
    Argument, CallIdentity, ComponentId, ComponentType, DiagnosticListener, DisplayEncoder,
    KeyBuilder, MethodSignature,
};
use callkey::infra::telemetry;
use metrics_util::debugging::DebuggingRecorder;

struct PanickingListener;

impl DiagnosticListener for PanickingListener {
    fn notify(&self, _message: &str) {
        panic!("listener failure");
    }
}

#[test]
fn key_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let builder = KeyBuilder::new(DisplayEncoder)
        .with_listeners([Arc::new(PanickingListener) as Arc<dyn DiagnosticListener>]);
    let repo_type = ComponentType::new("Repo");
    let component = ComponentId::new("c1");
    let find = MethodSignature::new("Find").with_parameter("String");

    // built
    let id = "7".to_string();
    let arguments = [Some(Argument::display(&id))];
    assert!(
        builder
            .full_key(&CallIdentity::new(&repo_type, &component, &find, &arguments))
            .is_some()
    );

    // opted out
    let bytes = vec![7_u8];
    let arguments = [Some(Argument::new(&bytes))];
    assert!(
        builder
            .full_key(&CallIdentity::new(&repo_type, &component, &find, &arguments))
            .is_none()
    );

    // suspicious, delivered to a panicking listener
    let own_type_name = std::any::type_name::<String>().to_string();
    let arguments = [Some(Argument::display(&own_type_name))];
    assert!(
        builder
            .full_key(&CallIdentity::new(&repo_type, &component, &find, &arguments))
            .is_some()
    );

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "callkey_keys_built_total",
        "callkey_key_opt_out_total",
        "callkey_suspicious_parameter_total",
        "callkey_listener_failure_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
