//! Trait definitions for query builders.

use crate::error::{SqlError, SqlResult};
use crate::executor::Executor;
use crate::qb::render::Fragment;
use crate::record::{FromRecord, Record};

/// Base trait for all query builders.
///
/// `render` is a pure read of the builder: it can be called any number of
/// times and yields the same `(sql, bindings)` pair each time.
pub trait SqlQb: Sync {
    /// Render SQL text and its ordered bindings, validating builder state.
    fn render(&self) -> SqlResult<Fragment>;

    /// Debug helper to get the SQL string.
    fn to_sql(&self) -> SqlResult<String> {
        self.render().map(|f| f.sql)
    }

    /// Execute query and return all records.
    fn fetch_all(
        &self,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = SqlResult<Vec<Record>>> + Send {
        async move {
            let built = self.render()?;
            exec.query(&built.sql, &built.bindings).await
        }
    }

    /// Execute query and return the first record, or [`SqlError::NotFound`].
    fn fetch_one(
        &self,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = SqlResult<Record>> + Send {
        async move {
            self.fetch_opt(exec)
                .await?
                .ok_or_else(|| SqlError::not_found("Expected 1 row, got 0"))
        }
    }

    /// Execute query and return the first record, if any.
    fn fetch_opt(
        &self,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = SqlResult<Option<Record>>> + Send {
        async move {
            let rows = self.fetch_all(exec).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute query and map all records to `T`.
    fn fetch_all_as<T: FromRecord>(
        &self,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = SqlResult<Vec<T>>> + Send {
        async move {
            let rows = self.fetch_all(exec).await?;
            rows.iter().map(T::from_record).collect()
        }
    }

    /// Execute query and map the first record to `T`.
    fn fetch_one_as<T: FromRecord>(
        &self,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = SqlResult<T>> + Send {
        async move {
            let row = self.fetch_one(exec).await?;
            T::from_record(&row)
        }
    }
}

/// Trait for mutation builders (INSERT/UPDATE/DELETE).
pub trait MutationQb: SqlQb {
    /// Execute and return affected row count.
    fn execute(
        &self,
        exec: &impl Executor,
    ) -> impl std::future::Future<Output = SqlResult<u64>> + Send {
        async move {
            let built = self.render()?;
            exec.execute(&built.sql, &built.bindings).await
        }
    }
}
