//! Production record source: the operational PostgreSQL database.

use std::time::Instant;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use postgres::{Client, NoTls, Row};

use crate::catalog;
use crate::config::DbConfig;
use crate::error::Result;
use crate::model::ServiceOrderRecord;
use crate::status::{derive_status_with_rule, StatusInputs};

use super::OrderSource;

/// Earliest generation date included in the dashboard.
pub const GENERATION_CUTOFF: NaiveDate = match NaiveDate::from_ymd_opt(2025, 6, 1) {
    Some(d) => d,
    None => panic!("invalid cutoff date"),
};

/// Timestamps are cast to `timestamp` (no time zone) so they load as
/// `NaiveDateTime` whatever the column type upstream.
///
/// `$1` is the generation cutoff, `$2` the service-type allow-list.
pub const SERVICE_ORDERS_SQL: &str = "
    SELECT
        os.orse_id::bigint                      AS orse_id,
        os.imov_id::bigint                      AS imov_id,
        i.loca_id::bigint                       AS loca_id,
        os.orse_tmgeracao::timestamp            AS data_geracao,
        os.orse_tmencerramento::timestamp       AS data_conclusao,
        os.svtp_id::int                         AS svtp_id,
        os.orse_cdsituacao::int                 AS orse_cdsituacao,
        os.amen_id::int                         AS amen_id,
        oss.osst_dssituacao::text               AS osst_dssituacao,
        st.svtp_dsservicotipo::text             AS descricao_servico,
        me.amen_dsmotivoencerramento::text      AS motivo_encerramento
    FROM atendimentopublico.ordem_servico os
    JOIN cadastro.imovel i
        ON os.imov_id = i.imov_id
    JOIN atendimentopublico.servico_tipo st
        ON os.svtp_id = st.svtp_id
    JOIN atendimentopublico.ordem_servico_situacao oss
        ON os.orse_cdsituacao = oss.osst_id
    LEFT JOIN atendimentopublico.atend_motivo_encmt me
        ON os.amen_id = me.amen_id
    WHERE os.svtp_id = ANY($2::int[])
      AND os.orse_tmgeracao >= $1::timestamp
      AND os.orse_tmgeracao <= NOW()
";

/// Raw column values of one query row, before derivation.
#[derive(Debug, Clone)]
pub struct RawOrderRow {
    pub order_id: i64,
    pub property_id: i64,
    pub locality_id: i64,
    pub generated_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
    pub service_type_code: i32,
    pub situation_code: i32,
    pub closure_reason_id: Option<i32>,
    pub situation_description: Option<String>,
    pub service_description: Option<String>,
    pub closure_reason: Option<String>,
}

impl RawOrderRow {
    fn from_row(row: &Row) -> std::result::Result<Self, postgres::Error> {
        Ok(Self {
            order_id: row.try_get(0)?,
            property_id: row.try_get(1)?,
            locality_id: row.try_get(2)?,
            generated_at: row.try_get(3)?,
            closed_at: row.try_get(4)?,
            service_type_code: row.try_get(5)?,
            situation_code: row.try_get(6)?,
            closure_reason_id: row.try_get(7)?,
            situation_description: row.try_get(8)?,
            service_description: row.try_get(9)?,
            closure_reason: row.try_get(10)?,
        })
    }
}

/// Apply the categorization and status rules to a raw row.
pub fn derive_record(raw: RawOrderRow) -> ServiceOrderRecord {
    let situation_description = raw.situation_description.unwrap_or_default();
    let (status, rule) = derive_status_with_rule(&StatusInputs {
        situation_code: raw.situation_code,
        closure_reason_id: raw.closure_reason_id,
        situation_description: &situation_description,
    });
    if rule == "situation" {
        log::debug!(
            "Order {} fell through to the situation label '{}' (situation {}, closure reason {:?})",
            raw.order_id,
            situation_description,
            raw.situation_code,
            raw.closure_reason_id
        );
    }

    let mut record = ServiceOrderRecord {
        order_id: raw.order_id,
        property_id: raw.property_id,
        locality_id: raw.locality_id,
        generated_at: raw.generated_at,
        closed_at: raw.closed_at,
        service_type: catalog::categorize(raw.service_type_code),
        status,
        service_description: raw.service_description.unwrap_or_default(),
        closure_reason: raw.closure_reason,
    };
    record.clear_pending_closure();
    record
}

/// Reads service orders from PostgreSQL with one query per fetch.
pub struct PostgresSource {
    config: DbConfig,
}

impl PostgresSource {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

impl OrderSource for PostgresSource {
    fn name(&self) -> &str {
        "postgres"
    }

    fn fetch(&self) -> Result<Vec<ServiceOrderRecord>> {
        let started = Instant::now();
        log::info!("Querying service orders from {}", self.config);

        let mut client = Client::connect(&self.config.connection_string(), NoTls)?;

        let cutoff = GENERATION_CUTOFF.and_time(NaiveTime::MIN);
        let codes = catalog::allowed_codes();
        let rows = client.query(SERVICE_ORDERS_SQL, &[&cutoff, &codes])?;

        let records = rows
            .iter()
            .map(|row| RawOrderRow::from_row(row).map(derive_record))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        log::info!(
            "Loaded {} service orders in {} ms",
            records.len(),
            started.elapsed().as_millis()
        );
        Ok(records)
    }
}
