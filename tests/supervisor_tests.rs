//! Worker supervisor integration tests against real child processes.

use std::time::Duration;

use spinup::cluster::{LifecycleEvent, Supervisor, WorkerExit, WorkerLauncher, WorkerState};
use spinup::lifecycle::Shutdown;

/// Launcher running a shell stub in place of a real worker.
fn stub_launcher(script: &str) -> WorkerLauncher {
    WorkerLauncher::custom("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

/// Drain events, applying everything up to (but not including) the next
/// `Exited`, which is returned unapplied.
async fn wait_for_exit(supervisor: &mut Supervisor) -> (u32, WorkerExit) {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), supervisor.next_event())
            .await
            .expect("timed out waiting for a worker exit")
            .expect("event channel closed");
        match event {
            LifecycleEvent::Exited { id, exit } => return (id, exit),
            other => supervisor.handle_event(other),
        }
    }
}

/// Drain events until `predicate` holds after applying an event.
async fn drain_until(supervisor: &mut Supervisor, predicate: impl Fn(&Supervisor) -> bool) {
    while !predicate(supervisor) {
        let event = tokio::time::timeout(Duration::from_secs(10), supervisor.next_event())
            .await
            .expect("timed out draining events")
            .expect("event channel closed");
        supervisor.handle_event(event);
    }
}

#[tokio::test]
async fn master_spawns_exactly_the_configured_pool() {
    let mut supervisor = Supervisor::new(stub_launcher("sleep 5"), 3, Shutdown::new());
    supervisor.spawn_all().unwrap();

    assert_eq!(supervisor.live_count(), 3);
    assert_eq!(supervisor.worker_ids(), vec![1, 2, 3]);
    for id in supervisor.worker_ids() {
        let worker = supervisor.worker(id).unwrap();
        assert_eq!(worker.state, WorkerState::Spawning);
        assert_ne!(worker.pid, 0);
    }

    supervisor.begin_shutdown();
    drain_until(&mut supervisor, |s| s.live_count() == 0).await;
}

#[tokio::test]
async fn worker_reports_online_then_listening() {
    let script = r#"printf '{"event":"online"}\n{"event":"listening","address":"127.0.0.1","port":8081}\n'; sleep 5"#;
    let mut supervisor = Supervisor::new(stub_launcher(script), 1, Shutdown::new());
    supervisor.spawn_all().unwrap();

    drain_until(&mut supervisor, |s| {
        s.worker(1).map(|w| w.state) == Some(WorkerState::Online)
    })
    .await;
    drain_until(&mut supervisor, |s| {
        s.worker(1).map(|w| w.state) == Some(WorkerState::Listening)
    })
    .await;

    supervisor.begin_shutdown();
    drain_until(&mut supervisor, |s| s.live_count() == 0).await;
}

#[tokio::test]
async fn crashed_worker_is_replaced_restoring_the_pool() {
    let mut supervisor = Supervisor::new(stub_launcher("exit 3"), 1, Shutdown::new());
    supervisor.spawn_all().unwrap();
    assert_eq!(supervisor.live_count(), 1);

    let (id, exit) = wait_for_exit(&mut supervisor).await;
    assert_eq!(id, 1);
    assert_eq!(exit.code, Some(3));
    assert_eq!(exit.describe(), "3");

    supervisor.handle_event(LifecycleEvent::Exited { id, exit });

    // Pool restored with a fresh id; the dead handle is gone.
    assert_eq!(supervisor.live_count(), 1);
    assert_eq!(supervisor.worker_ids(), vec![2]);
    assert_eq!(
        supervisor.worker(2).map(|w| w.state),
        Some(WorkerState::Spawning)
    );

    // Stop the crash loop before the replacement's exit is processed.
    supervisor.begin_shutdown();
    drain_until(&mut supervisor, |s| s.live_count() == 0).await;
}

#[tokio::test]
async fn sigkilled_worker_restarts_under_its_signal_name() {
    let mut supervisor = Supervisor::new(stub_launcher("sleep 30"), 1, Shutdown::new());
    supervisor.spawn_all().unwrap();

    let pid = supervisor.worker(1).unwrap().pid;
    let killed = std::process::Command::new("/bin/sh")
        .args(["-c", &format!("kill -9 {pid}")])
        .status()
        .expect("kill should run");
    assert!(killed.success());

    let (id, exit) = wait_for_exit(&mut supervisor).await;
    assert_eq!(id, 1);
    assert_eq!(exit.signal, Some(9));
    assert_eq!(exit.describe(), "SIGKILL");

    supervisor.handle_event(LifecycleEvent::Exited { id, exit });

    // One replacement with a new id, pool back at strength.
    assert_eq!(supervisor.live_count(), 1);
    assert_eq!(supervisor.worker_ids(), vec![2]);

    supervisor.begin_shutdown();
    drain_until(&mut supervisor, |s| s.live_count() == 0).await;
}

#[tokio::test]
async fn graceful_exits_shrink_the_pool_permanently() {
    let mut supervisor = Supervisor::new(stub_launcher("sleep 30"), 2, Shutdown::new());
    supervisor.spawn_all().unwrap();
    assert_eq!(supervisor.live_count(), 2);

    supervisor.begin_shutdown();
    drain_until(&mut supervisor, |s| s.live_count() == 0).await;

    // Terminal: handles stay tracked as Exited, nothing respawned.
    assert_eq!(supervisor.worker_ids(), vec![1, 2]);
    for id in [1, 2] {
        assert_eq!(
            supervisor.worker(id).map(|w| w.state),
            Some(WorkerState::Exited)
        );
    }
}

#[tokio::test]
async fn disconnect_precedes_exit_for_a_crashing_worker() {
    let script = r#"printf '{"event":"online"}\n'; exit 7"#;
    let mut supervisor = Supervisor::new(stub_launcher(script), 1, Shutdown::new());
    supervisor.spawn_all().unwrap();

    let mut saw_online = false;
    let mut saw_disconnect = false;
    loop {
        let event = tokio::time::timeout(Duration::from_secs(10), supervisor.next_event())
            .await
            .expect("timed out waiting for events")
            .expect("event channel closed");
        match &event {
            LifecycleEvent::Online { .. } => saw_online = true,
            LifecycleEvent::Disconnected { .. } => {
                assert!(saw_online, "online should precede disconnect");
                saw_disconnect = true;
            }
            LifecycleEvent::Exited { exit, .. } => {
                assert!(saw_disconnect, "disconnect should precede exit");
                assert_eq!(exit.code, Some(7));
                break;
            }
            LifecycleEvent::Listening { .. } => {}
        }
        supervisor.handle_event(event);
    }

    supervisor.begin_shutdown();
}
