use nav_cli::HttpWaypointSink;
use nav_core::Waypoint;
use nav_mission::WaypointSink;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{timeout, Duration};

#[test]
fn sink_needs_a_runtime() {
    assert!(HttpWaypointSink::new("http://127.0.0.1:9/route").is_err());
}

#[tokio::test]
async fn publishes_waypoints_as_json() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.ends_with(b"]") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n")
            .await
            .unwrap();
        String::from_utf8(request).unwrap()
    });

    let mut sink = HttpWaypointSink::new(format!("http://{addr}/route")).unwrap();
    sink.publish(&[
        Waypoint::new(0.0, 0.0, 5.0, 0.0),
        Waypoint::new(3.0, 4.0, 5.0, 0.9),
    ])
    .unwrap();

    let request = timeout(Duration::from_secs(10), server).await.unwrap().unwrap();
    assert!(request.starts_with("POST /route"));
    let body = request.split("\r\n\r\n").nth(1).unwrap();
    let waypoints: Vec<Waypoint> = serde_json::from_str(body).unwrap();
    assert_eq!(waypoints.len(), 2);
    assert_eq!(waypoints[1].heading, 0.9);
}

#[tokio::test]
async fn unreachable_viewer_does_not_fail_publish() {
    // Port 9 (discard) is closed on loopback in practice; the error is logged.
    let mut sink = HttpWaypointSink::new("http://127.0.0.1:9/route").unwrap();
    assert!(sink.publish(&[Waypoint::default()]).is_ok());
}
