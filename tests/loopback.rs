//! End-to-end transfers over a real TCP connection
use std::path::Path;

use indicatif::{MultiProgress, ProgressDrawTarget};
use pretty_assertions::assert_eq;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use ferry::{
    client::{parse_manifest, schedule, Downloader, Rejection},
    protocol::common::TcpStreamPair,
    server::Server,
    Configuration,
};

fn populate(root: &Path) {
    std::fs::create_dir_all(root.join("logs")).unwrap();
    std::fs::write(root.join("big.bin"), (0..200_000u32).map(|i| (i % 253) as u8).collect::<Vec<_>>()).unwrap();
    std::fs::write(root.join("small.txt"), b"small file\n").unwrap();
    std::fs::write(root.join("empty"), b"").unwrap();
    std::fs::write(root.join("logs").join("today.log"), b"log line\n".repeat(100)).unwrap();
}

fn config(root: &Path, output: &Path) -> Configuration {
    let mut c = Configuration::system_default().clone();
    c.root = root.to_path_buf();
    c.output_dir = output.to_path_buf();
    c.port = 0;
    c.chunk_size = 1000;
    c
}

#[tokio::test]
async fn fetch_over_tcp() {
    let served = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    populate(served.path());
    let cfg = config(served.path(), out.path());

    let server = Server::bind(&cfg).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server_task = tokio::spawn(server.run(shutdown.clone()));

    let stream = TcpStream::connect(addr).await.unwrap();
    let downloader = Downloader::new(
        TcpStreamPair::from(stream),
        &cfg,
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        true,
        CancellationToken::new(),
    );
    let catalog = downloader.receive_catalog().await.unwrap();
    assert_eq!(
        catalog.entries(),
        ["big.bin", "empty", "logs/today.log", "small.txt"]
    );

    let manifest = parse_manifest(
        "# wanted\nbig.bin\nlogs/today.log CRITICAL\nmissing.txt HIGH\nsmall.txt high\nempty\n",
    );
    let plan = schedule(manifest, &catalog, &cfg);
    assert_eq!(
        plan.rejected,
        vec![Rejection::NotInCatalog {
            path: "missing.txt".into()
        }]
    );
    let order: Vec<_> = plan.jobs.iter().map(|j| j.request.path.clone()).collect();
    assert_eq!(order, ["logs/today.log", "small.txt", "big.bin", "empty"]);

    let stats = downloader.run(plan).await.unwrap();
    downloader.close().await.unwrap();
    assert_eq!(stats.downloaded, 4);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.rejected, 1);

    for (remote, local) in [
        ("big.bin", "big.bin"),
        ("small.txt", "small.txt"),
        ("empty", "empty"),
        ("logs/today.log", "today.log"),
    ] {
        let expected = std::fs::read(served.path().join(remote)).unwrap();
        let got = std::fs::read(out.path().join(local)).unwrap();
        assert_eq!(got, expected, "{remote}");
    }

    shutdown.cancel();
    server_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn two_clients_at_once() {
    let served = tempfile::tempdir().unwrap();
    populate(served.path());
    let outs = [tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap()];
    let cfg = config(served.path(), outs[0].path());

    let server = Server::bind(&cfg).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let server_task = tokio::spawn(server.run(shutdown.clone()));

    let mut clients = tokio::task::JoinSet::new();
    for out in &outs {
        let cfg = config(served.path(), out.path());
        let _ = clients.spawn(async move {
            let stream = TcpStream::connect(addr).await.unwrap();
            let downloader = Downloader::new(
                TcpStreamPair::from(stream),
                &cfg,
                MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
                true,
                CancellationToken::new(),
            );
            let catalog = downloader.receive_catalog().await.unwrap();
            let plan = schedule(parse_manifest("big.bin\nsmall.txt\n"), &catalog, &cfg);
            let stats = downloader.run(plan).await.unwrap();
            downloader.close().await.unwrap();
            stats
        });
    }
    while let Some(stats) = clients.join_next().await {
        let stats = stats.unwrap();
        assert!(stats.all_succeeded());
        assert_eq!(stats.downloaded, 2);
    }
    for out in &outs {
        assert_eq!(
            std::fs::read(out.path().join("big.bin")).unwrap(),
            std::fs::read(served.path().join("big.bin")).unwrap()
        );
    }

    shutdown.cancel();
    server_task.await.unwrap().unwrap();
}
