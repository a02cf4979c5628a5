//! QuestDB table setup.
//!
//! Tables auto-created by line protocol ingestion have no deduplication, so
//! every rewrite of the lookback window would append another copy of each
//! point. Both measurements are created up front (or altered, if they already
//! exist) with upsert keys over the designated timestamp and the tag columns.

use std::time::Duration;

use crate::{
    reconcile::ReconcileError,
    transform::{
        Measurement, FIELD_COST, FIELD_QUANTITY, FIELD_RATE, FIELD_STANDING_CHARGE, TAG_PERIOD, TAG_RESOURCE,
    },
};

const EXEC_TIMEOUT: Duration = Duration::from_secs(30);
const TIMESTAMP_COLUMN: &str = "timestamp";

struct TableSchema {
    measurement: Measurement,
    tags: &'static [&'static str],
    fields: &'static [&'static str],
}

const TABLES: [TableSchema; 2] = [
    TableSchema {
        measurement: Measurement::EnergyUsage,
        tags: &[TAG_RESOURCE, TAG_PERIOD],
        fields: &[FIELD_QUANTITY, FIELD_COST],
    },
    TableSchema {
        measurement: Measurement::EnergyTariff,
        tags: &[TAG_RESOURCE],
        fields: &[FIELD_RATE, FIELD_STANDING_CHARGE],
    },
];

impl TableSchema {
    fn upsert_keys(&self) -> String {
        std::iter::once(TIMESTAMP_COLUMN)
            .chain(self.tags.iter().copied())
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn create_statement(&self) -> String {
        let columns = self
            .tags
            .iter()
            .map(|tag| format!("{tag} SYMBOL"))
            .chain(self.fields.iter().map(|field| format!("{field} DOUBLE")))
            .chain(std::iter::once(format!("{TIMESTAMP_COLUMN} TIMESTAMP")))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {table} ({columns}) TIMESTAMP({TIMESTAMP_COLUMN}) \
             PARTITION BY DAY WAL DEDUP UPSERT KEYS({keys})",
            table = self.measurement.as_str(),
            keys = self.upsert_keys(),
        )
    }

    /// Covers tables that existed before, e.g. auto-created by an earlier ILP write.
    fn dedup_statement(&self) -> String {
        format!(
            "ALTER TABLE {table} DEDUP ENABLE UPSERT KEYS({keys})",
            table = self.measurement.as_str(),
            keys = self.upsert_keys(),
        )
    }
}

/// Statements issued by [`ensure_tables`], in order.
pub fn table_statements() -> Vec<String> {
    TABLES
        .iter()
        .flat_map(|table| [table.create_statement(), table.dedup_statement()])
        .collect()
}

/// Runs the table setup through QuestDB's HTTP `/exec` endpoint. Any rejected
/// statement fails the whole setup.
pub async fn ensure_tables(http_url: &str) -> Result<(), ReconcileError> {
    let http = reqwest::Client::builder()
        .timeout(EXEC_TIMEOUT)
        .build()
        .map_err(|e| ReconcileError::Store(format!("failed to build questdb client: {e}")))?;
    let exec_url = format!("{}/exec", http_url.trim_end_matches('/'));

    for statement in table_statements() {
        let response = http
            .get(&exec_url)
            .query(&[("query", statement.as_str())])
            .send()
            .await
            .map_err(|e| ReconcileError::Store(format!("questdb exec failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(http_status = status.as_u16(), body = %body, statement = %statement, "questdb rejected table setup");
            return Err(ReconcileError::Store(format!(
                "questdb rejected table setup with http status {status}: {body}"
            )));
        }
    }

    tracing::info!(tables = TABLES.len(), "questdb tables ready with upsert keys");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    #[test]
    fn statements_key_on_timestamp_and_tags() {
        assert_eq!(
            table_statements(),
            [
                "CREATE TABLE IF NOT EXISTS energy_usage (resource SYMBOL, period SYMBOL, quantity DOUBLE, cost DOUBLE, \
                 timestamp TIMESTAMP) TIMESTAMP(timestamp) PARTITION BY DAY WAL DEDUP UPSERT KEYS(timestamp, resource, period)",
                "ALTER TABLE energy_usage DEDUP ENABLE UPSERT KEYS(timestamp, resource, period)",
                "CREATE TABLE IF NOT EXISTS energy_tariff (resource SYMBOL, rate DOUBLE, standingCharge DOUBLE, \
                 timestamp TIMESTAMP) TIMESTAMP(timestamp) PARTITION BY DAY WAL DEDUP UPSERT KEYS(timestamp, resource)",
                "ALTER TABLE energy_tariff DEDUP ENABLE UPSERT KEYS(timestamp, resource)",
            ]
        );
    }

    #[tokio::test]
    async fn issues_every_statement_through_exec() {
        let server = MockServer::start().await;
        for statement in table_statements() {
            Mock::given(method("GET"))
                .and(path("/exec"))
                .and(query_param("query", statement.as_str()))
                .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ddl":"OK"}"#))
                .expect(1)
                .mount(&server)
                .await;
        }

        ensure_tables(&format!("{}/", server.uri())).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_statement_fails_setup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/exec"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_string(r#"{"query":"ALTER TABLE energy_usage ...","error":"table is not WAL","position":12}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let res = ensure_tables(&server.uri()).await;
        match res {
            Err(ReconcileError::Store(msg)) => assert!(msg.contains("table is not WAL"), "{msg}"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
