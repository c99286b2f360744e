//! End-to-end process semantics: mailboxes, links, monitors, exit trapping,
//! registration and routing, exercised through spawned processes.

use starlang_core::pattern::Pattern;
use starlang_core::{reason, Atom, Pid, Ref, Term};
use starlang_runtime::{task_local, Context, Dest, Node, NodeConfig, RouterOptions, Routed, Signal};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

const GUARD: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Waits for `{'DOWN', Reference, process, _, Reason}` and returns `Reason`.
async fn down_reason(observer: &Context, reference: Ref) -> Term {
    let pattern = Pattern::tuple([
        Pattern::literal(Term::atom("DOWN")),
        Pattern::literal(reference),
        Pattern::literal(Term::atom("process")),
        Pattern::Wildcard,
        Pattern::capture("Reason"),
    ]);
    let msg = observer
        .receive_pattern(&pattern, Some(GUARD))
        .await
        .expect("DOWN message");
    pattern.bind(&msg).expect("bindings")["Reason"].clone()
}

async fn wait_until_dead(node: &Node, pid: Pid) {
    while node.is_alive(pid) {
        tokio::task::yield_now().await;
    }
}

async fn wait_for_len(ctx: &Context, len: usize) {
    while ctx.mailbox().len() < len {
        tokio::task::yield_now().await;
    }
}

/// A process that waits for one message and then exits normally.
async fn idle(ctx: Context) -> Result<(), starlang_core::OtpError> {
    ctx.receive().await?;
    Ok(())
}

#[tokio::test]
async fn test_messages_arrive_in_send_order() {
    init_tracing();
    let node = Node::new(NodeConfig::new().dispatch_batch(4));
    let receiver = node.make_context().unwrap();
    let to = receiver.pid();

    node.spawn(move |ctx| async move {
        for i in 0..50 {
            ctx.send(to, Term::Int(i))?;
        }
        Ok(())
    })
    .unwrap();

    for expected in 0..50 {
        let msg = receiver.receive_timeout(GUARD).await.unwrap();
        assert_eq!(msg, Term::Int(expected));
    }
}

#[tokio::test]
async fn test_selective_receive_keeps_skipped_messages_in_order() {
    let node = Node::default();
    let ctx = node.make_context().unwrap();
    for text in ["x", "y", "z"] {
        node.deliver(ctx.pid(), Term::from(text));
    }
    wait_for_len(&ctx, 3).await;

    let only_y = Arc::new(|m: &Term| m.as_str() == Some("y"));
    assert_eq!(ctx.receive_match(only_y, None).await.unwrap(), Term::from("y"));
    assert_eq!(ctx.receive().await.unwrap(), Term::from("x"));
    assert_eq!(ctx.receive().await.unwrap(), Term::from("z"));
}

#[tokio::test(start_paused = true)]
async fn test_receive_timeout_leaves_no_trace() {
    let node = Node::default();
    let ctx = node.make_context().unwrap();
    let started = tokio::time::Instant::now();

    let err = ctx
        .receive_timeout(Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(ctx.mailbox().is_empty());
    assert_eq!(ctx.mailbox().pending_consumers(), 0);

    node.deliver(ctx.pid(), Term::from("later"));
    wait_for_len(&ctx, 1).await;
    assert_eq!(ctx.receive().await.unwrap(), Term::from("later"));
}

#[tokio::test]
async fn test_link_propagates_custom_reason() {
    init_tracing();
    let node = Node::default();
    let observer = node.make_context().unwrap();

    let (parent, reference) = observer
        .spawn_monitor(|ctx| async move {
            ctx.spawn_link(|_| async { Err(Term::from("custom").into()) })?;
            ctx.receive().await?;
            Ok(())
        })
        .unwrap();

    assert_eq!(down_reason(&observer, reference).await, Term::from("custom"));
    assert!(!node.is_alive(parent));
}

#[tokio::test]
async fn test_normal_exit_propagates_to_untrapped_links() {
    let node = Node::default();
    let ctx = node.make_context().unwrap();

    ctx.spawn_link(|_| async { Ok(()) }).unwrap();

    assert_eq!(
        tokio::time::timeout(GUARD, ctx.exited()).await.unwrap(),
        reason::normal()
    );
}

#[tokio::test]
async fn test_kill_terminates_with_killed() {
    let node = Node::default();
    let observer = node.make_context().unwrap();
    let (target, reference) = observer.spawn_monitor(idle).unwrap();

    observer.exit(target, reason::kill()).unwrap();

    assert_eq!(down_reason(&observer, reference).await, reason::killed());
}

#[tokio::test]
async fn test_kill_propagates_as_killed_to_untrapped_link() {
    let node = Node::default();
    let observer = node.make_context().unwrap();
    let (a, reference) = observer.spawn_monitor(idle).unwrap();
    let b = node.spawn(idle).unwrap();
    node.link(a, b);

    observer.exit(b, reason::kill()).unwrap();

    assert_eq!(down_reason(&observer, reference).await, reason::killed());
    assert!(!node.is_alive(b));
}

#[tokio::test]
async fn test_trap_exit_contains_kill_of_linked_process() {
    init_tracing();
    let node = Node::default();
    let a = node.make_context().unwrap();
    a.trap_exit(true);

    let b = a.spawn_link(idle).unwrap();
    node.exit(node.system_pid(), b, reason::kill()).unwrap();

    let msg = a.receive_timeout(GUARD).await.unwrap();
    assert_eq!(
        msg,
        Term::tuple([Term::atom("EXIT"), b.into(), reason::killed()])
    );
    assert!(a.is_alive());
    assert!(a.links().is_empty());
}

#[tokio::test]
async fn test_trapping_process_stops_a_cascade() {
    let node = Node::default();
    let observer = node.make_context().unwrap();

    // observer monitors `middle`, which traps exits and links to a crasher.
    let (middle, reference) = observer
        .spawn_monitor(|ctx| async move {
            ctx.trap_exit(true);
            let crasher = ctx.spawn_link(|_| async { Err(Term::atom("boom").into()) })?;
            let msg = ctx.receive().await?;
            let expected = Term::tuple([Term::atom("EXIT"), crasher.into(), Term::atom("boom")]);
            if msg == expected {
                Ok(())
            } else {
                Err(Term::atom("unexpected").into())
            }
        })
        .unwrap();

    assert_eq!(down_reason(&observer, reference).await, reason::normal());
    assert!(!node.is_alive(middle));
}

#[tokio::test]
async fn test_monitor_on_dead_process_reports_noproc() {
    let node = Node::default();
    let observer = node.make_context().unwrap();
    let dead = node.spawn(|_| async { Ok(()) }).unwrap();
    wait_until_dead(&node, dead).await;

    let reference = observer.monitor(dead);

    assert_eq!(down_reason(&observer, reference).await, reason::noproc());
}

#[tokio::test]
async fn test_link_to_dead_process_delivers_noproc_exit() {
    let node = Node::default();
    let ctx = node.make_context().unwrap();
    ctx.trap_exit(true);
    let dead = node.make_pid().unwrap();

    ctx.link(dead);

    let msg = ctx.receive_timeout(GUARD).await.unwrap();
    assert_eq!(
        msg,
        Term::tuple([Term::atom("EXIT"), dead.into(), reason::noproc()])
    );
}

#[tokio::test]
async fn test_demonitor_suppresses_down() {
    let node = Node::default();
    let observer = node.make_context().unwrap();
    let target = node.spawn(idle).unwrap();

    let reference = observer.monitor(target);
    observer.demonitor(reference);
    observer.exit(target, reason::kill()).unwrap();
    wait_until_dead(&node, target).await;

    // A second monitor on the dead process is answered after anything the
    // first one could still have produced.
    let probe = observer.monitor(target);
    let msg = observer.receive_timeout(GUARD).await.unwrap();
    let tuple = msg.as_tuple().unwrap();
    assert_eq!(tuple[1], Term::Ref(probe));
    assert!(observer.monitors().is_empty());
}

#[tokio::test]
async fn test_registration_is_exclusive_and_released_on_death() {
    let node = Node::default();
    let observer = node.make_context().unwrap();
    let (first, reference) = observer.spawn_monitor(idle).unwrap();
    let second = node.spawn(idle).unwrap();

    node.register(first, "service").unwrap();
    assert!(node.register(second, "service").unwrap_err().is_badarg());
    assert_eq!(node.whereis("service"), Some(first));

    node.deliver("service", Term::atom("stop"));
    assert_eq!(down_reason(&observer, reference).await, reason::normal());

    assert_eq!(node.whereis("service"), None);
    node.register(second, "service").unwrap();
    assert_eq!(node.whereis("service"), Some(second));
}

#[tokio::test]
async fn test_unlink_is_idempotent() {
    let node = Node::default();
    let a = node.make_context().unwrap();
    let b = a
        .spawn_link(|ctx| async move {
            ctx.receive().await?;
            Err(Term::atom("custom").into())
        })
        .unwrap();

    a.unlink(b);
    a.unlink(b);
    let reference = a.monitor(b);
    node.deliver(b, Term::atom("go"));

    // An EXIT from b would have been handled before its DOWN and killed a.
    assert_eq!(down_reason(&a, reference).await, Term::atom("custom"));
    assert!(a.is_alive());
    assert!(a.links().is_empty());
}

#[tokio::test]
async fn test_panicking_body_exits_with_panic_reason() {
    let node = Node::default();
    let observer = node.make_context().unwrap();

    let (_, reference) = observer
        .spawn_monitor(|_| async { panic!("boom") })
        .unwrap();

    assert_eq!(
        down_reason(&observer, reference).await,
        Term::tuple([Term::atom("panic"), Term::from("boom")])
    );
}

#[tokio::test]
async fn test_spawned_body_sees_its_own_pid() {
    let node = Node::default();
    let observer = node.make_context().unwrap();
    let to = observer.pid();

    let pid = node
        .spawn(move |ctx| async move {
            let me = task_local::current_pid();
            ctx.send(to, me)?;
            Ok(())
        })
        .unwrap();

    assert_eq!(observer.receive_timeout(GUARD).await.unwrap(), Term::Pid(pid));
    assert_eq!(task_local::try_current_pid(), None);
}

#[tokio::test]
async fn test_pids_and_refs_are_unique() {
    let node = Node::default();
    let mut pids = HashSet::new();
    for _ in 0..100 {
        let ctx = node.make_context().unwrap();
        assert!(pids.insert(ctx.pid()));
        ctx.die(reason::normal());
    }

    let refs: HashSet<Ref> = (0..1000).map(|_| node.make_ref()).collect();
    assert_eq!(refs.len(), 1000);
}

#[tokio::test]
async fn test_signals_route_through_cheapest_router() {
    init_tracing();
    let node = Node::new(NodeConfig::new().name("a@host"));
    let sender = node.make_context().unwrap();
    let slow = node.make_context().unwrap();
    let fast = node.make_context().unwrap();

    node.register_router("b@host", 10, slow.pid(), RouterOptions::new())
        .unwrap();
    node.register_router("b@host", 1, fast.pid(), RouterOptions::new())
        .unwrap();

    sender.send(("logger", "b@host"), "hi").unwrap();

    let envelope = fast.receive_timeout(GUARD).await.unwrap();
    assert_eq!(
        Routed::from_term(&envelope),
        Some(Routed {
            from: sender.pid(),
            to: Dest::Remote(Atom::new("logger"), Atom::new("b@host")),
            signal: Signal::Relay(Term::from("hi")),
        })
    );
    assert!(slow.mailbox().is_empty());

    let remote = node.remote_pid("b@host", 5, 0, 1);
    sender.link(remote);
    let envelope = fast.receive_timeout(GUARD).await.unwrap();
    assert_eq!(
        Routed::from_term(&envelope).map(|routed| routed.signal),
        Some(Signal::Link)
    );
}

#[tokio::test]
async fn test_routes_disappear_with_their_router() {
    let node = Node::new(NodeConfig::new().name("a@host"));
    let observer = node.make_context().unwrap();
    let router = node.make_context().unwrap();
    node.register_router("b@host", 1, router.pid(), RouterOptions::new())
        .unwrap();
    assert_eq!(node.nodes(), vec![Atom::new("a@host"), Atom::new("b@host")]);

    router.die(reason::shutdown());

    assert_eq!(node.nodes(), vec![Atom::new("a@host")]);
    assert!(observer
        .send(("logger", "b@host"), "hi")
        .unwrap_err()
        .is_noconnection());

    let remote = node.remote_pid("b@host", 5, 0, 1);
    let reference = observer.monitor(remote);
    assert_eq!(down_reason(&observer, reference).await, reason::noconnection());
}

#[tokio::test]
async fn test_link_to_unroutable_node_delivers_noconnection_exit() {
    let node = Node::new(NodeConfig::new().name("a@host"));
    let ctx = node.make_context().unwrap();
    ctx.trap_exit(true);
    let remote = node.remote_pid("c@host", 7, 0, 1);

    ctx.link(remote);

    let msg = ctx.receive_timeout(GUARD).await.unwrap();
    assert_eq!(
        msg,
        Term::tuple([Term::atom("EXIT"), remote.into(), reason::noconnection()])
    );
    assert!(ctx.is_alive());
}

#[tokio::test]
async fn test_local_node_name_resolves_locally() {
    let node = Node::new(NodeConfig::new().name("a@host"));
    let ctx = node.make_context().unwrap();
    ctx.register("me").unwrap();

    node.deliver(("me", "a@host"), Term::atom("ping"));

    assert_eq!(ctx.receive_timeout(GUARD).await.unwrap(), Term::atom("ping"));
}

#[tokio::test]
async fn test_exit_cascades_along_a_link_chain() {
    let node = Node::default();
    let observer = node.make_context().unwrap();

    let (_, reference) = observer
        .spawn_monitor(|ctx| async move {
            let mut last = ctx.pid();
            for _ in 0..10 {
                let next = ctx.spawn(idle)?;
                ctx.node().link(last, next);
                last = next;
            }
            ctx.exit(last, Term::atom("chain"))?;
            ctx.receive().await?;
            Ok(())
        })
        .unwrap();

    assert_eq!(down_reason(&observer, reference).await, Term::atom("chain"));
    tokio::time::timeout(GUARD, async {
        while node.process_count() > 1 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}
