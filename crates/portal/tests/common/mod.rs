//! Common test utilities for portal integration tests.
//!
//! Seeds an in-memory backend with one association, a user per role and the
//! tenant tables, and builds a [`TestServer`] over the real router.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, header};
use axum_test::{TestResponse, TestServer};
use serde_json::json;
use softget_backend::backends::memory::InMemoryBackend;
use softget_backend::types::{SessionTokens, User};
use softget_portal::session::{ResponseCookies, SessionStore};
use softget_portal::{AppState, PortalConfig};

pub const COOKIE: HeaderName = header::COOKIE;

pub const ASSOCIATION: &str = "a-1";
pub const OTHER_ASSOCIATION: &str = "a-2";
pub const ASSOCIATION_NAME: &str = "Associação Rural Vale Verde";

pub const PRESIDENT: &str = "u-presidente";
pub const TREASURER: &str = "u-tesoureiro";
pub const SECRETARY: &str = "u-secretario";
pub const MEMBER: &str = "u-associado";
pub const OUTSIDER: &str = "u-sem-acesso";
pub const DUPLICATED: &str = "u-duplicado";
pub const UNKNOWN_ROLE: &str = "u-papel-invalido";

/// Returns the email seeded for a user id.
pub fn email(user_id: &str) -> String {
    format!("{}@example.org", user_id)
}

/// Creates a seeded backend.
pub fn seeded_backend() -> Arc<InMemoryBackend> {
    seeded_backend_with_ttl(3600)
}

/// Creates a seeded backend issuing access tokens valid for `ttl_secs`.
pub fn seeded_backend_with_ttl(ttl_secs: i64) -> Arc<InMemoryBackend> {
    let backend = InMemoryBackend::with_access_ttl(ttl_secs);

    for user in [
        PRESIDENT,
        TREASURER,
        SECRETARY,
        MEMBER,
        OUTSIDER,
        DUPLICATED,
        UNKNOWN_ROLE,
    ] {
        backend.add_user(User::new(user, email(user)));
    }

    backend.insert_rows(
        "Associacoes",
        vec![
            json!({"id": ASSOCIATION, "nome_associacao": ASSOCIATION_NAME}),
            json!({"id": OTHER_ASSOCIATION, "nome_associacao": "Cooperativa Serra Azul"}),
        ],
    );
    backend.insert_rows(
        "Permissoes_Usuarios",
        vec![
            grant(PRESIDENT, ASSOCIATION, "PRESIDENTE"),
            grant(PRESIDENT, OTHER_ASSOCIATION, "CONTADOR"),
            grant(TREASURER, ASSOCIATION, "TESOUREIRO"),
            grant(SECRETARY, ASSOCIATION, "SECRETARIO"),
            grant(MEMBER, ASSOCIATION, "ASSOCIADO"),
            grant(DUPLICATED, ASSOCIATION, "PRESIDENTE"),
            grant(DUPLICATED, ASSOCIATION, "ASSOCIADO"),
            grant(UNKNOWN_ROLE, ASSOCIATION, "ADMIN"),
        ],
    );

    backend.insert_rows(
        "Pessoas",
        vec![
            json!({"id": "p-1", "nome_completo": "Ana Souza", "cpf": "111.111.111-11", "email": "ana@example.org"}),
            json!({"id": "p-2", "nome_completo": "Bruno Lima", "cpf": "222.222.222-22"}),
            json!({"id": "p-3", "nome_completo": "Carla Dias", "cpf": "333.333.333-33"}),
        ],
    );
    backend.insert_rows(
        "Membros",
        vec![
            member("m-1", "p-1", "Fundador", "Ativo", 50.0),
            member("m-2", "p-2", "Efetivo", "Ativo", 50.0),
            member("m-3", "p-3", "Contribuinte", "Inadimplente", 30.0),
            json!({"id": "m-9", "associacao_id": OTHER_ASSOCIATION, "situacao": "Ativo",
                   "categoria": "Efetivo", "valor_mensalidade_base": 999}),
        ],
    );
    backend.insert_rows(
        "Lancamentos_Financeiros",
        vec![
            entry(50.0, "Mensalidades", "Receita", "2025-03-05", Some("m-1")),
            entry(50.0, "Mensalidades", "Receita", "2025-03-07", None),
            entry(800.0, "Verbas Governamentais", "Receita", "2025-03-10", None),
            entry(-250.0, "Manutenção", "Despesa", "2025-03-15", None),
            entry(120.0, "Doações", "Receita", "2025-02-20", None),
            entry(-40.0, "", "Despesa", "2025-02-21", None),
        ],
    );
    backend.insert_rows(
        "Patrimonio",
        vec![
            json!({"id": "b-2", "associacao_id": ASSOCIATION, "nome_item": "Trator Massey", "tipo": "Trator",
                   "status": "Em uso", "valor_aquisicao": 85000}),
            json!({"id": "b-1", "associacao_id": ASSOCIATION, "nome_item": "Arado", "tipo": "Implemento",
                   "status": "Disponível", "valor_aquisicao": 4000}),
        ],
    );
    backend.insert_rows(
        "Uso_Patrimonio",
        vec![
            json!({"id": "u-1", "associacao_id": ASSOCIATION, "patrimonio_id": "b-2", "pessoa_id": "p-1",
                   "data_retirada": "2025-03-01", "finalidade": "Plantio"}),
            json!({"id": "u-2", "associacao_id": ASSOCIATION, "patrimonio_id": "b-1", "pessoa_id": "p-2",
                   "data_retirada": "2025-03-09", "data_devolucao": "2025-03-10", "finalidade": "Preparo"}),
        ],
    );
    backend.insert_rows(
        "Obrigacoes",
        vec![
            json!({"id": "o-1", "associacao_id": ASSOCIATION, "tipo": "DCTF", "categoria": "Fiscal",
                   "data_referencia": "2025-01-31", "status": "Entregue"}),
            json!({"id": "o-2", "associacao_id": ASSOCIATION, "tipo": "Prestação anual",
                   "categoria": "Prestação de Contas", "data_referencia": "2025-02-28", "status": "Pendente"}),
        ],
    );
    backend.insert_rows(
        "Mandatos",
        vec![
            json!({"id": "d-1", "associacao_id": ASSOCIATION, "pessoa_id": "p-1", "cargo": "Presidente",
                   "categoria": "Executivo", "ativo": true, "descricao_mandato": "Gestão 2024-2026"}),
            json!({"id": "d-2", "associacao_id": ASSOCIATION, "pessoa_id": "p-2", "cargo": "Conselheiro",
                   "categoria": "Conselho Fiscal", "ativo": true}),
            json!({"id": "d-0", "associacao_id": ASSOCIATION, "pessoa_id": "p-3", "cargo": "Presidente",
                   "categoria": "Executivo", "ativo": false}),
        ],
    );

    Arc::new(backend)
}

fn grant(user_id: &str, association_id: &str, role: &str) -> serde_json::Value {
    json!({"user_id": user_id, "associacao_id": association_id, "papel": role})
}

fn member(id: &str, person: &str, category: &str, status: &str, dues: f64) -> serde_json::Value {
    json!({
        "id": id,
        "associacao_id": ASSOCIATION,
        "pessoa_id": person,
        "categoria": category,
        "situacao": status,
        "valor_mensalidade_base": dues,
        "data_admissao": "2020-01-15"
    })
}

fn entry(
    valor: f64,
    categoria: &str,
    tipo: &str,
    date: &str,
    member: Option<&str>,
) -> serde_json::Value {
    json!({
        "associacao_id": ASSOCIATION,
        "valor": valor,
        "categoria": categoria,
        "tipo": tipo,
        "data_lancamento": date,
        "membro_id": member
    })
}

/// Creates a test server over `backend` with the testing configuration.
pub fn create_test_server(backend: Arc<InMemoryBackend>) -> TestServer {
    create_test_server_with_config(backend, PortalConfig::for_testing())
}

/// Creates a test server over `backend` with a custom configuration.
pub fn create_test_server_with_config(
    backend: Arc<InMemoryBackend>,
    config: PortalConfig,
) -> TestServer {
    let state = AppState::new(backend, config);
    let app = softget_portal::routing::portal_routes::create_routes(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Signs a user in and returns the issued tokens.
pub fn sign_in(backend: &InMemoryBackend, user_id: &str) -> SessionTokens {
    backend
        .issue_session(user_id)
        .expect("user should be seeded")
}

/// Renders `tokens` as the `Cookie` header a browser would send.
pub fn session_cookie(tokens: &SessionTokens) -> HeaderValue {
    let mut store = ResponseCookies::default();
    PortalConfig::for_testing()
        .session_cookie()
        .write(&mut store, tokens);
    store
        .request_cookie_header()
        .expect("session cookie should be written")
}

/// Signs a user in and returns the matching `Cookie` header.
pub fn signed_in_cookie(backend: &InMemoryBackend, user_id: &str) -> HeaderValue {
    session_cookie(&sign_in(backend, user_id))
}

/// Returns every `Set-Cookie` header of a response.
pub fn set_cookies(response: &TestResponse) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}

/// Turns `Set-Cookie` headers into the `Cookie` header a browser would
/// send next, dropping removed cookies.
pub fn cookie_jar(set_cookies: &[String]) -> Option<HeaderValue> {
    let mut store = ResponseCookies::default();
    let options = PortalConfig::for_testing().cookie_options();
    for set_cookie in set_cookies {
        let pair = set_cookie.split(';').next().unwrap_or_default();
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if set_cookie.contains("Max-Age=0") {
            store.remove(name, &options);
        } else {
            store.set(name, value, &options);
        }
    }
    store.request_cookie_header()
}

/// Reads the session carried by `Set-Cookie` headers.
pub fn session_from(set_cookies: &[String]) -> Option<SessionTokens> {
    let mut store = ResponseCookies::default();
    let options = PortalConfig::for_testing().cookie_options();
    for set_cookie in set_cookies {
        let pair = set_cookie.split(';').next().unwrap_or_default();
        if let Some((name, value)) = pair.split_once('=') {
            store.set(name, value, &options);
        }
    }
    PortalConfig::for_testing().session_cookie().read(&store)
}

/// Returns the `Location` header of a redirect.
pub fn location(response: &TestResponse) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

