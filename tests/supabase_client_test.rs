use mcq_generator::error::StoreError;
use mcq_generator::models::{AnswerKey, Mcq, McqOptions, NewQuestion, NewQuiz};
use mcq_generator::{QuizStore, SupabaseClient};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "service-role-test-key";
const BUCKET: &str = "mcq-files";

fn client(server: &MockServer) -> SupabaseClient {
    SupabaseClient::with_base_url(server.uri(), KEY, BUCKET)
}

fn quiz_row(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "title": "Quiz from notes.txt",
        "source_file": "20250301_101500_notes.txt",
        "total_questions": 2,
        "created_at": "2025-03-01T10:15:00.123456"
    })
}

fn question_row(id: i64, number: i64, answer: &str) -> serde_json::Value {
    json!({
        "id": id,
        "quiz_id": 7,
        "question_number": number,
        "question_text": format!("Question {}?", number),
        "option_a": "a",
        "option_b": "b",
        "option_c": "c",
        "option_d": "d",
        "correct_answer": answer,
        "explanation": null
    })
}

#[tokio::test]
async fn insert_quiz_returns_created_row() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/quizzes"))
        .and(header("apikey", KEY))
        .and(header("authorization", format!("Bearer {}", KEY).as_str()))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({
            "title": "Quiz from notes.txt",
            "source_file": "20250301_101500_notes.txt",
            "total_questions": 2
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([quiz_row(7)])))
        .expect(1)
        .mount(&server)
        .await;

    let new_quiz = NewQuiz::from_upload("20250301_101500_notes.txt", "notes.txt", 2);
    let quiz = client(&server).insert_quiz(&new_quiz).await.unwrap();

    assert_eq!(quiz.id, 7);
    assert_eq!(quiz.created_at, "2025-03-01T10:15:00.123456");
}

#[tokio::test]
async fn insert_quiz_with_empty_representation_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/quizzes"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let new_quiz = NewQuiz::from_upload("x_notes.txt", "notes.txt", 1);
    let err = client(&server).insert_quiz(&new_quiz).await.unwrap_err();
    assert!(matches!(err, StoreError::EmptyInsert { .. }));
}

#[tokio::test]
async fn insert_questions_sends_one_bulk_request() {
    let server = MockServer::start().await;

    let mcq = Mcq {
        question: "Question 1?".to_string(),
        options: McqOptions {
            a: "a".to_string(),
            b: "b".to_string(),
            c: "c".to_string(),
            d: "d".to_string(),
        },
        correct_answer: AnswerKey::B,
        explanation: "why".to_string(),
    };
    let questions = vec![
        NewQuestion::from_mcq(7, 1, &mcq),
        NewQuestion::from_mcq(7, 2, &mcq),
    ];

    Mock::given(method("POST"))
        .and(path("/rest/v1/questions"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!([
            {
                "quiz_id": 7, "question_number": 1, "question_text": "Question 1?",
                "option_a": "a", "option_b": "b", "option_c": "c", "option_d": "d",
                "correct_answer": "B", "explanation": "why"
            },
            {
                "quiz_id": 7, "question_number": 2, "question_text": "Question 1?",
                "option_a": "a", "option_b": "b", "option_c": "c", "option_d": "d",
                "correct_answer": "B", "explanation": "why"
            }
        ])))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([question_row(1, 1, "B"), question_row(2, 2, "B")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rows = client(&server).insert_questions(&questions).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].question_number, 2);
    assert_eq!(rows[0].explanation, None);
}

#[tokio::test]
async fn list_questions_filters_and_orders() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/questions"))
        .and(query_param("quiz_id", "eq.7"))
        .and(query_param("order", "question_number.asc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([question_row(1, 1, "A"), question_row(2, 2, "D")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let rows = client(&server).list_questions(7).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].correct_answer, AnswerKey::D);
}

#[tokio::test]
async fn get_quiz_returns_none_for_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/quizzes"))
        .and(query_param("id", "eq.99"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let quiz = client(&server).get_quiz(99).await.unwrap();
    assert!(quiz.is_none());
}

#[tokio::test]
async fn recent_quizzes_orders_by_creation_time() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/quizzes"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([quiz_row(9), quiz_row(8)])))
        .expect(1)
        .mount(&server)
        .await;

    let quizzes = client(&server).recent_quizzes(10).await.unwrap();
    let ids: Vec<i64> = quizzes.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![9, 8]);
}

#[tokio::test]
async fn delete_quiz_removes_questions_then_quiz() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/questions"))
        .and(query_param("quiz_id", "eq.7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/quizzes"))
        .and(query_param("id", "eq.7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_quiz(7).await.unwrap();
}

#[tokio::test]
async fn upload_blob_goes_to_bucket() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/mcq-files/20250301_101500_notes.txt"))
        .and(header("apikey", KEY))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "mcq-files/x" })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .upload_blob("20250301_101500_notes.txt", b"hello".to_vec(), "text/plain")
        .await
        .unwrap();
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/quizzes"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
        .mount(&server)
        .await;

    let err = client(&server).recent_quizzes(10).await.unwrap_err();
    match err {
        StoreError::BadStatus { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "Invalid API key");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

async fn uploaded_path(name: &str) -> String {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "mcq-files/x" })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .upload_blob(name, b"hello".to_vec(), "text/plain")
        .await
        .unwrap();

    let requests = server
        .received_requests()
        .await
        .expect("request recording is enabled");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.query().is_none());
    assert!(requests[0].url.fragment().is_none());
    requests[0].url.path().to_string()
}

#[tokio::test]
async fn upload_blob_encodes_reserved_characters() {
    let path = uploaded_path("20250301_101500_week#3 notes?.txt").await;
    assert_eq!(
        path,
        "/storage/v1/object/mcq-files/20250301_101500_week%233%20notes%3F.txt"
    );
}

#[tokio::test]
async fn upload_blob_keeps_dot_segments_inside_bucket() {
    let path = uploaded_path("20250301_101500_a/../../../../../rest/v1/quizzes").await;
    assert!(path.starts_with("/storage/v1/object/mcq-files/"));
    assert_eq!(
        path,
        "/storage/v1/object/mcq-files/20250301_101500_a%2F..%2F..%2F..%2F..%2F..%2Frest%2Fv1%2Fquizzes"
    );
}
