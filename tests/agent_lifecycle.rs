//! Connection lifecycle and registration-phase integration tests.

mod common;

use std::sync::Arc;

use parking_lot::Mutex;

use common::{
    CONNECT_FAIL_MSG, CONNECTED_MSG, DISCONNECTED_MSG, ConnectEvent, MockEngine, test_agent,
};
use subagent::engine::{LogSeverity, ProcessOutcome};
use subagent::value::{Value, ValueKind};
use subagent::{Agent, AgentStatus, Error, ObjectExport};

#[test]
fn new_agent_starts_in_registration() {
    let engine = MockEngine::new();
    let agent = test_agent(engine.clone());
    assert_eq!(agent.status(), AgentStatus::Registration);
    assert_eq!(engine.inits.lock().as_slice(), ["test-agent"]);
    assert!(engine.configs.lock()[0].agent_role);
    assert_eq!(
        engine.configs.lock()[0].master_socket.as_deref(),
        Some("tcp:localhost:705")
    );
}

#[tokio::test]
async fn first_connect_failure_is_fatal() {
    let engine = MockEngine::with_connect_script(vec![ConnectEvent::Log(
        LogSeverity::Warning,
        CONNECT_FAIL_MSG,
    )]);
    let sink_lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = sink_lines.clone();
    let agent = Agent::builder(engine.clone())
        .name("test-agent")
        .master_socket("tcp:localhost:705")
        .resolver(common::MockResolver::new())
        .log_sink(move |_severity, message| captured.lock().push(message.to_string()))
        .build()
        .unwrap();

    let err = agent.start().await.unwrap_err();
    match err {
        Error::ConnectionFailed { target } => assert_eq!(target, "tcp:localhost:705"),
        other => panic!("expected ConnectionFailed, got {other}"),
    }
    assert_eq!(agent.status(), AgentStatus::ConnectFailed);
    // the failure line is suppressed from the sink; the caller saw the error
    assert!(sink_lines.lock().is_empty());
}

#[tokio::test]
async fn successful_connect_and_idempotent_start() {
    let engine = MockEngine::with_connect_script(vec![ConnectEvent::Log(
        LogSeverity::Info,
        CONNECTED_MSG,
    )]);
    let agent = test_agent(engine.clone());

    agent.start().await.unwrap();
    assert_eq!(agent.status(), AgentStatus::Connected);

    // already connected: start is a no-op, the engine is not reopened
    agent.start().await.unwrap();
    assert_eq!(engine.opens.lock().len(), 1);
}

#[tokio::test]
async fn disconnect_then_reconnect_cycle() {
    let engine = MockEngine::with_connect_script(vec![ConnectEvent::Log(
        LogSeverity::Info,
        CONNECTED_MSG,
    )]);
    let agent = test_agent(engine.clone());
    agent.start().await.unwrap();

    engine.emit_log(LogSeverity::Info, DISCONNECTED_MSG);
    assert_eq!(agent.status(), AgentStatus::Reconnecting);

    // a failure while reconnecting is non-fatal and leaves the status alone
    engine.emit_log(LogSeverity::Warning, CONNECT_FAIL_MSG);
    assert_eq!(agent.status(), AgentStatus::Reconnecting);

    engine.emit_log(LogSeverity::Info, CONNECTED_MSG);
    assert_eq!(agent.status(), AgentStatus::Connected);
}

#[tokio::test]
async fn index_stop_signal_reconnects() {
    let engine = MockEngine::with_connect_script(vec![ConnectEvent::Log(
        LogSeverity::Info,
        CONNECTED_MSG,
    )]);
    let agent = test_agent(engine.clone());
    agent.start().await.unwrap();

    engine.emit_index_stop();
    assert_eq!(agent.status(), AgentStatus::Reconnecting);
}

#[tokio::test]
async fn registration_after_start_fails_for_every_kind() {
    let engine = MockEngine::with_connect_script(vec![ConnectEvent::Log(
        LogSeverity::Info,
        CONNECTED_MSG,
    )]);
    let agent = test_agent(engine.clone());
    agent.start().await.unwrap();

    let err = agent
        .integer32("1.3.6.1.4.1.8072.1.0", 0, true, "", None)
        .unwrap_err();
    assert!(matches!(err, Error::RegistrationAfterStart { .. }));

    let err = agent
        .octet_string("1.3.6.1.4.1.8072.1.1", "x", false, "", None)
        .unwrap_err();
    assert!(matches!(err, Error::RegistrationAfterStart { .. }));

    let err = agent
        .table("TEST-MIB::testTable")
        .index(ValueKind::Integer32)
        .column(2, Value::Integer32(0), false)
        .register()
        .unwrap_err();
    assert!(matches!(err, Error::RegistrationAfterStart { .. }));
}

#[test]
fn scalar_registration_and_registry_listing() {
    let engine = MockEngine::new();
    let agent = test_agent(engine.clone());

    let scalar = agent
        .integer32("TEST-MIB::testScalar.0", 5, true, "", None)
        .unwrap();
    assert_eq!(scalar.get(), Value::Integer32(5));
    assert_eq!(scalar.oid().to_string(), "1.3.6.1.4.1.8072.1.0");
    assert_eq!(agent.format_oid(scalar.oid()), "1.3.6.1.4.1.8072.1.0");
    let resolved = agent.resolve_oid("TEST-MIB::testScalar.0").unwrap();
    assert_eq!(&resolved, scalar.oid());

    agent
        .counter64("1.3.6.1.4.1.8072.1.2", u64::MAX, false, "ctx", None)
        .unwrap();

    let mut contexts = agent.contexts();
    contexts.sort();
    assert_eq!(contexts, ["", "ctx"]);

    let entries = agent.registered("");
    let entry = &entries["TEST-MIB::testScalar.0"];
    assert_eq!(entry.kind, "Integer32");
    assert_eq!(entry.value, ObjectExport::Scalar(Value::Integer32(5)));

    // Counter64 survives externalization at full width
    let entries = agent.registered("ctx");
    assert_eq!(
        entries["1.3.6.1.4.1.8072.1.2"].value,
        ObjectExport::Scalar(Value::Counter64(u64::MAX))
    );
}

#[test]
fn reregistration_overwrites() {
    let engine = MockEngine::new();
    let agent = test_agent(engine.clone());

    agent
        .integer32("1.3.6.1.4.1.8072.1.0", 1, true, "", None)
        .unwrap();
    agent
        .integer32("1.3.6.1.4.1.8072.1.0", 2, true, "", None)
        .unwrap();

    let entries = agent.registered("");
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries["1.3.6.1.4.1.8072.1.0"].value,
        ObjectExport::Scalar(Value::Integer32(2))
    );
}

#[test]
fn invalid_oid_is_rejected_at_registration() {
    let engine = MockEngine::new();
    // numeric-only agent: no resolver
    let agent = Agent::builder(engine)
        .name("numeric-agent")
        .use_mib_files(false)
        .build()
        .unwrap();

    let err = agent
        .integer32("TEST-MIB::testScalar.0", 0, true, "", None)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOid { .. }));

    assert!(agent.integer32("1.3.6.1.4", 0, true, "", None).is_ok());
}

#[test]
fn engine_registration_failure_propagates() {
    let engine = MockEngine::new();
    let agent = test_agent(engine.clone());

    *engine.fail_next.lock() = Some(-1);
    let err = agent
        .integer32("1.3.6.1.4.1.8072.1.0", 0, true, "", None)
        .unwrap_err();
    assert!(matches!(err, Error::AgentOperation { code: -1, .. }));
}

#[tokio::test]
async fn process_once_non_blocking_returns_idle() {
    let engine = MockEngine::new();
    let agent = test_agent(engine.clone());
    assert_eq!(
        agent.process_once(false).await.unwrap(),
        ProcessOutcome::Idle
    );
    assert_eq!(
        agent.process_once(true).await.unwrap(),
        ProcessOutcome::Processed
    );
}

#[test]
fn shutdown_reaches_engine() {
    let engine = MockEngine::new();
    let agent = test_agent(engine.clone());
    agent.shutdown().unwrap();
    assert_eq!(engine.shutdowns.lock().as_slice(), ["test-agent"]);
}

#[test]
fn trap_variable_list_shape() {
    let engine = MockEngine::new();
    let agent = test_agent(engine.clone());

    agent
        .trap("TEST-MIB::testNotification")
        .uptime(4711)
        .varbind("1.3.6.1.4.1.8072.1.0", Value::Integer32(7))
        .varbind("1.3.6.1.4.1.8072.1.2", Value::Counter64(u64::MAX))
        .context("trap-ctx")
        .send()
        .unwrap();

    let traps = engine.traps.lock();
    let (varbinds, context) = &traps[0];
    assert_eq!(context.as_deref(), Some("trap-ctx"));
    assert_eq!(varbinds.len(), 4);
    // uptime first, then the notification identity, then the payload
    assert_eq!(varbinds[0].oid.to_string(), "1.3.6.1.2.1.1.3.0");
    assert_eq!(varbinds[0].value, Value::TimeTicks(4711));
    assert_eq!(varbinds[1].oid.to_string(), "1.3.6.1.6.3.1.1.4.1.0");
    assert_eq!(
        varbinds[1].value,
        Value::ObjectIdentifier(subagent::oid!(1, 3, 6, 1, 4, 1, 8072, 9999))
    );
    assert_eq!(varbinds[2].value, Value::Integer32(7));
    assert_eq!(varbinds[3].value, Value::Counter64(u64::MAX));
}

#[test]
fn trap_without_uptime_leads_with_identity() {
    let engine = MockEngine::new();
    let agent = test_agent(engine.clone());

    agent.trap("1.3.6.1.4.1.8072.9999").send().unwrap();

    let traps = engine.traps.lock();
    let (varbinds, context) = &traps[0];
    assert_eq!(context.as_deref(), None);
    assert_eq!(varbinds.len(), 1);
    assert_eq!(varbinds[0].oid.to_string(), "1.3.6.1.6.3.1.1.4.1.0");
}

#[test]
fn easy_trap_passes_codes_through() {
    let engine = MockEngine::new();
    let agent = test_agent(engine.clone());
    agent.send_easy_trap(6, 42).unwrap();
    assert_eq!(engine.easy_traps.lock().as_slice(), [(6, 42)]);
}

#[test]
fn mib_files_are_loaded_through_the_resolver() {
    let engine = MockEngine::new();
    let resolver = common::MockResolver::new();
    let _agent = Agent::builder(engine)
        .name("test-agent")
        .resolver(resolver.clone())
        .mib_file("/usr/share/snmp/mibs/TEST-MIB.txt")
        .build()
        .unwrap();
    assert_eq!(
        resolver.loaded.lock().as_slice(),
        ["/usr/share/snmp/mibs/TEST-MIB.txt"]
    );
}
