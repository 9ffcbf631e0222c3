//! Income service: CRUD over incomes with reference reconciliation on write
//!
//! Every write runs in one IMMEDIATE SQLite transaction. Reference lookups,
//! the inserts they trigger, the income write and its audit events commit
//! or roll back together.

use crate::config::Config;
use crate::db::{self, Event};
use crate::entities::income_source::get_all_income_sources;
use crate::entities::person::{exists_person_by_name, exists_person_by_name_and_surname, get_all_persons};
use crate::entities::Income;
use crate::error::{Error, Result};
use crate::import::CsvRow;
use crate::pagination::PageRequest;
use crate::reconciliation::{reconcile_income_source, reconcile_person};
use crate::views::{IncomeSourceView, IncomeView, PersonView};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const ACTOR: &str = "income_service";

/// Outcome of a bulk import; one bad row never stops the rest
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub rejected: usize,
    pub errors: Vec<String>,
}

pub struct IncomeService {
    conn: Connection,
}

impl IncomeService {
    /// Wrap an already initialised connection (see `db::setup_database`)
    pub fn new(conn: Connection) -> Self {
        IncomeService { conn }
    }

    /// Open the database named by the configuration
    pub fn open(config: &Config) -> Result<Self> {
        let conn = db::open_database(
            &config.database_path,
            Duration::from_millis(config.busy_timeout_ms),
        )?;
        Ok(IncomeService::new(conn))
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        db::setup_database(&conn)?;
        Ok(IncomeService::new(conn))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// One zero-based page of incomes; past the end is an empty page
    pub fn list_incomes(&self, page_number: u32, page_size: u32) -> Result<Vec<IncomeView>> {
        info!(
            "reading incomes with query params, page number = [{}], page size = [{}]",
            page_number, page_size
        );

        let result = db::find_all_incomes(&self.conn, Some(PageRequest::of(page_number, page_size)))?;
        debug!("result from db: {:?}", result);

        Ok(convert_incomes(result))
    }

    pub fn list_all_incomes(&self) -> Result<Vec<IncomeView>> {
        info!("reading all incomes");

        let result = db::find_all_incomes(&self.conn, None)?;
        info!("number of read elements: [{}]", result.len());
        debug!("result: {:?}", result);

        Ok(convert_incomes(result))
    }

    pub fn find_income(&self, id: i64) -> Result<Option<IncomeView>> {
        info!("find income by id: [{}]", id);

        let result = db::find_income_by_id(&self.conn, id)?;
        debug!("result: [{:?}]", result);

        Ok(result.map(IncomeView::from))
    }

    pub fn list_persons(&self) -> Result<Vec<PersonView>> {
        Ok(get_all_persons(&self.conn)?
            .into_iter()
            .map(PersonView::from)
            .collect())
    }

    pub fn list_income_sources(&self) -> Result<Vec<IncomeSourceView>> {
        Ok(get_all_income_sources(&self.conn)?
            .into_iter()
            .map(IncomeSourceView::from)
            .collect())
    }

    pub fn person_exists(&self, name: &str, surname: Option<&str>) -> Result<bool> {
        match surname {
            Some(surname) => exists_person_by_name_and_surname(&self.conn, name, surname),
            None => exists_person_by_name(&self.conn, name),
        }
    }

    /// Audit events for one income, newest first
    pub fn income_history(&self, id: i64) -> Result<Vec<Event>> {
        db::get_events_for_entity(&self.conn, "income", id)
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Delete by id. Always `true` unless the store fails; absent ids are a no-op.
    pub fn delete_income(&mut self, id: i64) -> Result<bool> {
        info!("deleting by id: [{}]", id);

        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let deleted = db::delete_income_by_id(&tx, id)?;
        if deleted > 0 {
            db::insert_event(
                &tx,
                &Event::new("income_deleted", "income", id, serde_json::json!({}), ACTOR),
            )?;
        } else {
            debug!("income {} did not exist", id);
        }
        tx.commit()?;

        Ok(true)
    }

    /// Store the entity as-is, without reconciliation. Test fixture seam.
    pub fn create_income(&mut self, income: Income) -> Result<Income> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let saved = db::save_income(&tx, &income)?;
        tx.commit()?;

        info!("saved object: [{:?}]", saved);
        Ok(saved)
    }

    /// Create when the view has no id, update otherwise
    pub fn save_income(&mut self, view: IncomeView) -> Result<IncomeView> {
        match view.id {
            Some(id) => self.update_income(id, view),
            None => self.add_income(view),
        }
    }

    /// Create a new income; a view carrying an id is rejected
    pub fn add_income(&mut self, view: IncomeView) -> Result<IncomeView> {
        if view.id.is_some() {
            return Err(Error::validation(
                "id",
                "Must not be set when creating an income",
                "Income",
            ));
        }

        let income = Income::try_from(view)?;
        self.reconcile_and_save(income)
    }

    /// Update an existing income; `id` wins over any id in the view
    pub fn update_income(&mut self, id: i64, view: IncomeView) -> Result<IncomeView> {
        let mut income = Income::try_from(view)?;
        income.id = Some(id);
        self.reconcile_and_save(income)
    }

    /// Save each parsed row in its own unit of work. Rows that failed to
    /// parse are counted as rejected alongside rows the service refuses.
    pub fn import_incomes(&mut self, rows: Vec<CsvRow>) -> ImportSummary {
        let mut summary = ImportSummary::default();

        for row in rows {
            let result = row.parsed.and_then(|mut view| {
                view.id = None;
                self.add_income(view)
            });

            match result {
                Ok(_) => summary.imported += 1,
                Err(e) => {
                    warn!("Rejected line {}: {}", row.line, e);
                    summary.rejected += 1;
                    summary.errors.push(format!("line {}: {}", row.line, e));
                }
            }
        }

        info!(
            "imported {} incomes, rejected {}",
            summary.imported, summary.rejected
        );
        summary
    }

    fn reconcile_and_save(&mut self, mut income: Income) -> Result<IncomeView> {
        let tx = self.conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let person = reconcile_person(&tx, &income.person)?;
        if person.was_inserted() {
            let p = person.get();
            db::insert_event(
                &tx,
                &Event::new(
                    "person_created",
                    "person",
                    p.id.unwrap_or_default(),
                    serde_json::json!({ "name": p.name, "surname": p.surname }),
                    ACTOR,
                ),
            )?;
        }

        let source = reconcile_income_source(&tx, &income.income_source)?;
        if source.was_inserted() {
            let s = source.get();
            db::insert_event(
                &tx,
                &Event::new(
                    "income_source_created",
                    "income_source",
                    s.id.unwrap_or_default(),
                    serde_json::json!({ "name": s.name }),
                    ACTOR,
                ),
            )?;
        }

        income.person = person.into_inner();
        income.income_source = source.into_inner();

        let event_type = if income.is_persisted() {
            "income_updated"
        } else {
            "income_created"
        };
        info!("entity before saving: [{:?}]", income);

        let saved = db::save_income(&tx, &income)?;
        db::insert_event(
            &tx,
            &Event::new(
                event_type,
                "income",
                saved.id.unwrap_or_default(),
                serde_json::json!({
                    "income_value_in_cent": saved.income_value_in_cent,
                    "person_id": saved.person.id,
                    "income_source_id": saved.income_source.id,
                }),
                ACTOR,
            ),
        )?;

        tx.commit()?;
        info!("updated object: [{:?}]", saved);

        Ok(saved.into())
    }
}

fn convert_incomes(result: Vec<Income>) -> Vec<IncomeView> {
    result.into_iter().map(IncomeView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::income_source::{count_income_sources, insert_income_source};
    use crate::entities::person::{count_persons, insert_person};
    use crate::entities::{IncomeSource, Person, Sex};

    fn service() -> IncomeService {
        IncomeService::in_memory().unwrap()
    }

    fn anna_salary(value: i64) -> IncomeView {
        IncomeView::new(
            value,
            PersonView::named("Anna", Some("Kowalska"), None),
            IncomeSourceView::named("Salary"),
        )
    }

    fn row_counts(service: &IncomeService) -> (i64, i64, i64, i64) {
        let conn = service.connection();
        let events: i64 = conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .unwrap();
        (
            db::count_incomes(conn).unwrap(),
            count_persons(conn).unwrap(),
            count_income_sources(conn).unwrap(),
            events,
        )
    }

    #[test]
    fn test_save_round_trips_value_fields() {
        let mut service = service();

        let input = IncomeView::new(
            -4250,
            PersonView::named("Jan", Some("Kowalski"), Some(Sex::Male)),
            IncomeSourceView {
                id: None,
                name: Some("Refund".to_string()),
                description: Some("Tax office".to_string()),
            },
        );
        let saved = service.save_income(input.clone()).unwrap();

        assert!(saved.id.is_some());
        assert_eq!(saved.income_value_in_cent, input.income_value_in_cent);
        assert_eq!(saved.person.name, input.person.name);
        assert_eq!(saved.person.surname, input.person.surname);
        assert_eq!(saved.person.sex, input.person.sex);
        assert_eq!(saved.income_source.name, input.income_source.name);
        assert_eq!(saved.income_source.description, input.income_source.description);
        assert!(saved.creation_timestamp.is_some());

        let found = service.find_income(saved.id.unwrap()).unwrap().unwrap();
        assert_eq!(found, saved);
    }

    #[test]
    fn test_missing_person_name_fails_without_writes() {
        let mut service = service();
        service.save_income(anna_salary(1)).unwrap();
        let before = row_counts(&service);

        for name in [None, Some(""), Some("   ")] {
            let mut view = anna_salary(2);
            view.person.name = name.map(|n| n.to_string());
            view.person.surname = Some("Brand New".to_string());
            view.income_source.name = Some("Brand New Source".to_string());

            let err = service.save_income(view).unwrap_err();
            assert!(err.is_validation(), "unexpected error: {}", err);
        }

        assert_eq!(row_counts(&service), before);
    }

    #[test]
    fn test_identical_person_reuses_single_existing_row() {
        let mut service = service();
        let existing = insert_person(
            service.connection(),
            &Person::new("Anna", Some("Kowalska"), None),
        )
        .unwrap();

        let first = service.save_income(anna_salary(100)).unwrap();
        let second = service.save_income(anna_salary(200)).unwrap();

        assert_eq!(first.person.id, existing.id);
        assert_eq!(second.person.id, existing.id);
        assert_ne!(first.id, second.id);
        assert_eq!(count_persons(service.connection()).unwrap(), 1);
    }

    #[test]
    fn test_anna_kowalska_salary_scenario() {
        let mut service = service();
        let anna = insert_person(
            service.connection(),
            &Person::new("Anna", Some("Kowalska"), None),
        )
        .unwrap();
        let salary = insert_income_source(service.connection(), &IncomeSource::new("Salary", None)).unwrap();

        let saved = service.save_income(anna_salary(500000)).unwrap();

        assert_eq!(saved.income_value_in_cent, 500000);
        assert_eq!(saved.person.id, anna.id);
        assert_eq!(saved.income_source.id, salary.id);
        assert_eq!(row_counts(&service).0, 1);
        assert_eq!(count_persons(service.connection()).unwrap(), 1);
        assert_eq!(count_income_sources(service.connection()).unwrap(), 1);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let mut service = service();
        for value in 0..3 {
            service.save_income(anna_salary(value)).unwrap();
        }

        assert_eq!(service.list_incomes(0, 2).unwrap().len(), 2);
        assert_eq!(service.list_incomes(1, 2).unwrap().len(), 1);
        assert!(service.list_incomes(2, 2).unwrap().is_empty());
        assert!(service.list_incomes(100, 1).unwrap().is_empty());
        assert!(service.list_incomes(0, 0).unwrap().is_empty());
        assert_eq!(service.list_all_incomes().unwrap().len(), 3);
    }

    #[test]
    fn test_delete_always_true() {
        let mut service = service();
        let saved = service.save_income(anna_salary(10)).unwrap();
        let id = saved.id.unwrap();

        assert!(service.delete_income(id).unwrap());
        assert!(service.find_income(id).unwrap().is_none());
        assert!(service.delete_income(id).unwrap());
        assert!(service.delete_income(123456).unwrap());

        // Reference rows survive the delete
        assert_eq!(service.list_persons().unwrap().len(), 1);
        assert_eq!(service.list_income_sources().unwrap().len(), 1);
    }

    #[test]
    fn test_find_absent_income() {
        let service = service();
        assert!(service.find_income(1).unwrap().is_none());
    }

    #[test]
    fn test_add_rejects_caller_id() {
        let mut service = service();
        let mut view = anna_salary(10);
        view.id = Some(5);

        let err = service.add_income(view).unwrap_err();
        match err {
            Error::Validation(errors) => assert_eq!(errors[0].field, "id"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_keeps_creation_timestamp_and_ignores_supplied_ones() {
        let mut service = service();
        let saved = service.save_income(anna_salary(10)).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));

        let mut change = saved.clone();
        change.income_value_in_cent = 20;
        change.creation_timestamp = None;
        change.update_timestamp = Some(chrono::Utc::now() - chrono::Duration::days(365));
        let updated = service.save_income(change).unwrap();

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.income_value_in_cent, 20);
        assert_eq!(updated.creation_timestamp, saved.creation_timestamp);
        assert!(updated.update_timestamp > saved.update_timestamp);
        assert_eq!(service.list_all_incomes().unwrap().len(), 1);
    }

    #[test]
    fn test_update_unknown_id_rolls_back_reference_inserts() {
        let mut service = service();
        let before = row_counts(&service);

        let view = IncomeView::new(
            1,
            PersonView::named("Ghost", None, None),
            IncomeSourceView::named("Nowhere"),
        );
        let err = service.update_income(77, view).unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(row_counts(&service), before);
    }

    #[test]
    fn test_update_can_move_income_to_another_person() {
        let mut service = service();
        let saved = service.save_income(anna_salary(10)).unwrap();

        let mut change = saved.clone();
        change.person = PersonView::named("Jan", None, Some(Sex::Male));
        let updated = service.save_income(change).unwrap();

        assert_ne!(updated.person.id, saved.person.id);
        assert_eq!(updated.income_source.id, saved.income_source.id);
        assert_eq!(service.list_persons().unwrap().len(), 2);
    }

    #[test]
    fn test_create_income_bypasses_reconciliation() {
        let mut service = service();
        service.save_income(anna_salary(1)).unwrap();

        let fixture = Income::new(
            5,
            Person::new("Fixture", None, None),
            IncomeSource::new("Fixture Source", None),
        );
        let created = service.create_income(fixture).unwrap();

        assert!(created.id.is_some());
        assert!(created.person.id.is_some());
        assert_eq!(service.list_all_incomes().unwrap().len(), 2);
        // No audit events for the fixture path
        assert!(service.income_history(created.id.unwrap()).unwrap().is_empty());
    }

    #[test]
    fn test_history_records_lifecycle() {
        let mut service = service();
        let saved = service.save_income(anna_salary(10)).unwrap();
        let id = saved.id.unwrap();

        let mut change = saved.clone();
        change.income_value_in_cent = 11;
        service.save_income(change).unwrap();
        service.delete_income(id).unwrap();

        let types: Vec<String> = service
            .income_history(id)
            .unwrap()
            .into_iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(types, vec!["income_deleted", "income_updated", "income_created"]);
    }

    #[test]
    fn test_person_exists() {
        let mut service = service();
        service.save_income(anna_salary(10)).unwrap();

        assert!(service.person_exists("Anna", None).unwrap());
        assert!(service.person_exists("Anna", Some("Kowalska")).unwrap());
        assert!(!service.person_exists("Anna", Some("Nowak")).unwrap());
    }

    #[test]
    fn test_create_income_failure_leaves_no_partial_rows() {
        let mut service = service();
        insert_income_source(service.connection(), &IncomeSource::new("Salary", None)).unwrap();
        let before = row_counts(&service);

        // The source insert collides with the stored "Salary" after the person went in
        let fixture = Income::new(
            5,
            Person::new("Orphan", None, None),
            IncomeSource::new("Salary", None),
        );
        let err = service.create_income(fixture).unwrap_err();

        assert!(matches!(err, Error::Store(_)), "unexpected error: {}", err);
        assert_eq!(row_counts(&service), before);
        assert!(!service.person_exists("Orphan", None).unwrap());
    }

    #[test]
    fn test_import_continues_past_bad_rows() {
        let mut service = service();
        let mut bad = anna_salary(2);
        bad.person.name = None;
        let mut with_id = anna_salary(3);
        with_id.id = Some(99);

        let rows = vec![
            CsvRow { line: 2, parsed: Ok(anna_salary(1)) },
            CsvRow { line: 3, parsed: Ok(bad) },
            CsvRow { line: 4, parsed: Ok(with_id) },
        ];
        let summary = service.import_incomes(rows);

        assert_eq!(summary.imported, 2);
        assert_eq!(summary.rejected, 1);
        assert!(summary.errors[0].starts_with("line 3:"));
        assert_eq!(service.list_persons().unwrap().len(), 1);
    }

    #[test]
    fn test_import_counts_unparsable_csv_rows_as_rejected() {
        let mut service = service();
        let data = "Value_In_Cent,Name,Surname,Sex,Source\n\
                    100,Anna,,,Salary\n\
                    200,Jan,,X,Salary\n\
                    lots,Ola,,,Gift\n\
                    300,Ewa,,,Gift\n";

        let rows = crate::import::read_csv(data.as_bytes()).unwrap();
        let summary = service.import_incomes(rows);

        assert_eq!(summary.imported, 2);
        assert_eq!(summary.rejected, 2);
        assert!(summary.errors[0].starts_with("line 3:"), "{:?}", summary.errors);
        assert!(summary.errors[1].starts_with("line 4:"), "{:?}", summary.errors);
        assert_eq!(service.list_all_incomes().unwrap().len(), 2);
        assert_eq!(service.list_income_sources().unwrap().len(), 2);
    }
}
