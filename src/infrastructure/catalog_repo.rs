use diesel::prelude::*;

use crate::domain::catalog::{Extra, ServiceCatalogEntry};
use crate::domain::coupon::Coupon;
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::{coupons, extras, service_catalog};

use super::models::{CouponRow, ExtraRow, ServiceRow};
use super::DieselStore;

impl CatalogRepository for DieselStore {
    fn list_services(&self) -> Result<Vec<ServiceCatalogEntry>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = service_catalog::table
            .order(service_catalog::id.asc())
            .select(ServiceRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn find_service(&self, id: i32) -> Result<Option<ServiceCatalogEntry>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = service_catalog::table
            .find(id)
            .select(ServiceRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Into::into))
    }

    fn list_extras(&self) -> Result<Vec<Extra>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = extras::table
            .order(extras::id.asc())
            .select(ExtraRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn find_extras(&self, ids: &[i32]) -> Result<Vec<Extra>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = extras::table
            .filter(extras::id.eq_any(ids))
            .order(extras::id.asc())
            .select(ExtraRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let mut conn = self.pool.get()?;

        coupons::table
            .find(code)
            .select(CouponRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(CouponRow::into_domain)
            .transpose()
    }
}
