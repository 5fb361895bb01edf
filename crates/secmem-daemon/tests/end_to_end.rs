// Copyright (c) 2025-2026 Federico Hoerth <memparanoid@gmail.com>
// SPDX-License-Identifier: GPL-3.0-only
// See LICENSE in the repository root for full license text.

//! Full client/daemon sessions over real transports.

use std::sync::atomic::AtomicBool;
use std::thread;

use zeroize::Zeroizing;

use secmem_daemon::{DispatchLimits, Dispatcher, Server, StopReason};
use secmem_registry::ProcessView;
use secmem_wire::{ChannelTransport, Client, OpTag, PolicyRecord, Reply, Request, Tag, Transport};

fn call<T: Transport>(client: &Client<T>, request: Request) -> Reply {
    client
        .call(&request)
        .expect("Failed to call(..)")
        .expect("request should be answered")
}

fn session<T: Transport>(client: &Client<T>) {
    let load = call(
        client,
        Request::Load {
            pid: 7,
            arena_size: 0x100,
            policies: vec![PolicyRecord::new("(R|W)*"), PolicyRecord::new("RW")],
        },
    );
    assert_eq!(load.tag, Tag::ack(OpTag::Load));

    let alloc = call(
        client,
        Request::Alloc {
            pid: 7,
            size: 0x10,
            policy_id: 0,
        },
    );
    assert!(alloc.is_ack());
    let addr = alloc.field2;
    assert_eq!(addr, 0);

    let write = call(
        client,
        Request::Write {
            pid: 7,
            addr,
            data: Zeroizing::new(vec![0x0A, 0x0B, 0x0C, 0x0D]),
        },
    );
    assert!(write.is_ack());

    let read = call(client, Request::Read { pid: 7, addr, len: 4 });
    assert!(read.is_ack());
    assert_eq!(read.payload.as_slice(), &[0x0A, 0x0B, 0x0C, 0x0D]);

    // "RW" refuses a write before its read.
    let guarded = call(
        client,
        Request::Alloc {
            pid: 7,
            size: 0x20,
            policy_id: 1,
        },
    );
    assert_eq!(guarded.field2, 0x10);
    let refused = call(
        client,
        Request::Write {
            pid: 7,
            addr: 0x10,
            data: Zeroizing::new(vec![1]),
        },
    );
    assert_eq!(refused.tag, Tag::nak(OpTag::Write));

    let view = call(client, Request::View { pid: 7 });
    let view = ProcessView::decode(&view.payload).expect("Failed to decode(..)");
    assert_eq!(view.used_bytes, 0x30);
    assert_eq!(view.policies[0].ref_count, 1);
    assert_eq!(view.policies[1].ref_count, 1);
    assert_eq!(view.segments[1].state, Some(0));

    assert!(call(client, Request::Dealloc { pid: 7, addr }).is_ack());

    let stale = call(client, Request::Read { pid: 7, addr, len: 4 });
    assert_eq!(stale.tag, Tag::nak(OpTag::Read));
    assert!(stale.payload.is_empty());

    assert!(call(client, Request::Unload { pid: 7 }).is_ack());
    assert_eq!(
        call(client, Request::View { pid: 7 }).tag,
        Tag::nak(OpTag::View)
    );

    assert!(
        client
            .call(&Request::Terminate)
            .expect("Failed to call(..)")
            .is_none()
    );
}

#[test]
fn test_session_over_channel() {
    let (daemon, local) = ChannelTransport::pair();
    let handle = thread::spawn(move || {
        let server = Server::new(daemon, Dispatcher::new(DispatchLimits::default()));
        server.run(&AtomicBool::new(false))
    });

    session(&Client::new(local));

    let (reason, stats) = handle.join().expect("Failed to join()");
    assert_eq!(reason, StopReason::Terminated);
    assert_eq!(stats.replied + 1, stats.received);
}

#[test]
fn test_concurrent_clients_share_daemon() {
    let (daemon, local) = ChannelTransport::pair();
    let handle = thread::spawn(move || {
        let server = Server::new(daemon, Dispatcher::new(DispatchLimits::default()));
        server.run(&AtomicBool::new(false))
    });
    let client = Client::new(local);

    for pid in 1..=4 {
        let reply = call(
            &client,
            Request::Load {
                pid,
                arena_size: 0x40,
                policies: vec![PolicyRecord::new("(WR)*")],
            },
        );
        assert!(reply.is_ack());
    }
    for pid in 1..=4 {
        let alloc = call(
            &client,
            Request::Alloc {
                pid,
                size: 0x40,
                policy_id: 0,
            },
        );
        // Arenas are independent: every pid gets offset 0.
        assert_eq!(alloc.field2, 0);
    }

    drop(client);
    let (reason, _) = handle.join().expect("Failed to join()");
    assert_eq!(reason, StopReason::Disconnected);
}

#[cfg(target_os = "linux")]
#[test]
#[serial_test::serial(sysv)]
fn test_session_over_sysv() {
    use secmem_wire::SysvDuplex;

    let base = 0x5EC1_0000 + ((std::process::id() as i32 & 0xFFF) << 4);
    let (requests, replies) = (base + 1, base + 2);

    let Ok(daemon) = SysvDuplex::server(requests, replies) else {
        // SysV IPC unavailable in this sandbox.
        return;
    };
    daemon.inbound().drain().expect("Failed to drain()");
    daemon.outbound().drain().expect("Failed to drain()");

    let handle = thread::spawn(move || {
        let server = Server::new(daemon, Dispatcher::new(DispatchLimits::default()));
        let result = server.run(&AtomicBool::new(false));
        (result, server)
    });

    let client = SysvDuplex::client(requests, replies).expect("Failed to client(..)");
    let client = Client::new(client);
    session(&client);

    let ((reason, _), server) = handle.join().expect("Failed to join()");
    assert_eq!(reason, StopReason::Terminated);

    drop(server);
    drop(client);
    SysvDuplex::server(requests, replies)
        .and_then(SysvDuplex::remove)
        .expect("Failed to remove()");
}
