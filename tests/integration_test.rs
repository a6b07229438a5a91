use raft_mq::{
    AppendEntriesRequest, AppendEntriesResponse, InboundServer, LogEntry, MessageTransporter, Peer, RaftRpcHandler,
    RequestVoteRequest, RequestVoteResponse, RpcMessage, SnapshotRequest, TransportFailure, TransportOptions,
    Transporter,
};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::time::{Duration, Instant};

/// Stand-in for a consensus engine: grants votes for terms at or above its own and accepts every
/// append, remembering what it was sent.
struct FakeEngine {
    current_term: u64,
    votes_requested: Mutex<Vec<RequestVoteRequest>>,
    entries_received: Mutex<Vec<AppendEntriesRequest>>,
}

impl FakeEngine {
    fn new(current_term: u64) -> Arc<Self> {
        Arc::new(FakeEngine {
            current_term,
            votes_requested: Mutex::new(vec![]),
            entries_received: Mutex::new(vec![]),
        })
    }
}

#[async_trait::async_trait]
impl RaftRpcHandler for FakeEngine {
    async fn request_vote(&self, request: RequestVoteRequest) -> RequestVoteResponse {
        let vote_granted = request.term >= self.current_term;
        self.votes_requested.lock().unwrap().push(request.clone());

        RequestVoteResponse {
            term: std::cmp::max(request.term, self.current_term),
            vote_granted,
        }
    }

    async fn append_entries(&self, request: AppendEntriesRequest) -> AppendEntriesResponse {
        let index = request.prev_log_index + request.entries.len() as u64;
        let response = AppendEntriesResponse {
            term: request.term,
            index,
            commit_index: request.commit_index,
            success: true,
        };
        self.entries_received.lock().unwrap().push(request);

        response
    }
}

struct Node {
    transporter: MessageTransporter,
    engine: Arc<FakeEngine>,
    server: InboundServer,
}

impl Node {
    async fn start(name: &str, current_term: u64) -> Result<Self, Box<dyn Error>> {
        let logger = create_logger(name);
        let transporter = MessageTransporter::new(logger, TransportOptions::default())?;
        let engine = FakeEngine::new(current_term);
        let server = transporter.install("tcp://127.0.0.1:0", engine.clone()).await?;

        Ok(Node {
            transporter,
            engine,
            server,
        })
    }

    fn as_peer(&self, name: &str) -> Peer {
        Peer::new(name, self.server.local_endpoint().to_string())
    }
}

#[tokio::test]
async fn vote_request_is_granted_by_peer() -> Result<(), Box<dyn Error>> {
    let node_a = Node::start("A", 5).await?;
    let node_b = Node::start("B", 5).await?;

    let request = RequestVoteRequest {
        term: 5,
        last_log_index: 0,
        last_log_term: 0,
        candidate_name: "A".into(),
    };

    let started = Instant::now();
    let response = node_a
        .transporter
        .send_vote_request(&node_b.as_peer("B"), &request)
        .await?;

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(
        response,
        RequestVoteResponse {
            term: 5,
            vote_granted: true
        }
    );
    assert_eq!(*node_b.engine.votes_requested.lock().unwrap(), vec![request]);
    assert!(node_a.engine.votes_requested.lock().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn append_entries_passes_through_unchanged() -> Result<(), Box<dyn Error>> {
    let leader = Node::start("leader", 3).await?;
    let follower = Node::start("follower", 3).await?;

    let request = AppendEntriesRequest {
        term: 3,
        prev_log_index: 10,
        prev_log_term: 2,
        commit_index: 9,
        leader_name: "leader".into(),
        entries: vec![
            LogEntry {
                index: 11,
                term: 3,
                command_name: "write".into(),
                command: br#"{"key":"foo","value":"bar"}"#.to_vec(),
            },
            LogEntry {
                index: 12,
                term: 3,
                command_name: "write".into(),
                command: vec![0, 159, 146, 150],
            },
        ],
    };

    let response = leader
        .transporter
        .send_append_entries_request(&follower.as_peer("follower"), &request)
        .await?;
    assert_eq!(
        response,
        AppendEntriesResponse {
            term: 3,
            index: 12,
            commit_index: 9,
            success: true
        }
    );

    let received = follower.engine.entries_received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].encode_to_bytes()?, request.encode_to_bytes()?);

    Ok(())
}

#[tokio::test]
async fn stale_candidate_is_refused() -> Result<(), Box<dyn Error>> {
    let candidate = Node::start("candidate", 2).await?;
    let voter = Node::start("voter", 7).await?;

    let response = candidate
        .transporter
        .send_vote_request(
            &voter.as_peer("voter"),
            &RequestVoteRequest {
                term: 2,
                candidate_name: "candidate".into(),
                ..RequestVoteRequest::default()
            },
        )
        .await?;

    assert!(!response.vote_granted);
    assert_eq!(response.term, 7);

    Ok(())
}

#[tokio::test]
async fn append_entries_to_missing_peer_fails_within_timeout() -> Result<(), Box<dyn Error>> {
    let leader = Node::start("leader", 1).await?;

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);
    let missing = Peer::new("missing", format!("tcp://127.0.0.1:{}", port));

    let started = Instant::now();
    let result = leader
        .transporter
        .send_append_entries_request(&missing, &AppendEntriesRequest::default())
        .await;
    let elapsed = started.elapsed();

    assert!(result.is_err(), "Expected failure, got {:?}", result);
    assert!(elapsed >= Duration::from_millis(900), "Failed too early: {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1500), "Failed too late: {:?}", elapsed);

    Ok(())
}

#[tokio::test]
async fn concurrent_candidates_are_all_answered() -> Result<(), Box<dyn Error>> {
    let voter = Node::start("voter", 1).await?;
    let voter_peer = voter.as_peer("voter");

    let mut candidates = Vec::new();
    for i in 0..4 {
        candidates.push(Node::start(&format!("candidate-{}", i), 1).await?);
    }

    let calls = candidates.iter().enumerate().map(|(i, candidate)| {
        let request = RequestVoteRequest {
            term: 1 + i as u64,
            candidate_name: format!("candidate-{}", i),
            ..RequestVoteRequest::default()
        };
        let peer = voter_peer.clone();
        async move { candidate.transporter.send_vote_request(&peer, &request).await }
    });

    let responses = futures::future::join_all(calls).await;
    for (i, response) in responses.into_iter().enumerate() {
        let response = response?;
        assert!(response.vote_granted);
        assert_eq!(response.term, 1 + i as u64);
    }
    assert_eq!(voter.engine.votes_requested.lock().unwrap().len(), 4);

    Ok(())
}

#[tokio::test]
async fn snapshot_request_always_fails() -> Result<(), Box<dyn Error>> {
    let node_a = Node::start("A", 1).await?;
    let node_b = Node::start("B", 1).await?;

    let result = node_a
        .transporter
        .send_snapshot_request(
            &node_b.as_peer("B"),
            &SnapshotRequest {
                leader_name: "A".into(),
                last_index: 100,
                last_term: 1,
            },
        )
        .await;

    match result {
        Err(TransportFailure::Unsupported) => Ok(()),
        other => panic!("Unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn peer_is_unreachable_after_shutdown() -> Result<(), Box<dyn Error>> {
    let node_a = Node::start("A", 1).await?;
    let node_b = Node::start("B", 1).await?;
    let peer_b = node_b.as_peer("B");

    node_a
        .transporter
        .send_vote_request(&peer_b, &RequestVoteRequest::default())
        .await?;

    node_b.server.shutdown().await;

    let result = node_a
        .transporter
        .send_vote_request(&peer_b, &RequestVoteRequest::default())
        .await;
    assert!(result.is_err(), "Expected failure, got {:?}", result);

    Ok(())
}

// Set RAFT_MQ_TEST_LOG to see transport logs.
fn create_logger(name: &str) -> slog::Logger {
    if std::env::var("RAFT_MQ_TEST_LOG").is_ok() {
        raft_mq::create_root_logger_for_stdout(name.to_string())
    } else {
        raft_mq::discard_logger()
    }
}
