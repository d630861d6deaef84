//! Coupon endpoints.

use reqwest::header::CONTENT_TYPE;
use shopbag_core::types::{CouponId, OrderId, ProductId};
use tracing::instrument;

use crate::BackendClient;
use crate::auth::Credentials;
use crate::error::BackendError;
use crate::types::{
    ApplicableCoupon, ApplicableCoupons, CouponMemberPage, CouponPage, WelcomeCoupon,
    WelcomeCoupons,
};

impl BackendClient {
    /// The member's coupons, 1-based pages.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without credentials.
    #[instrument(skip(self, credentials))]
    pub async fn member_coupons(
        &self,
        credentials: &Credentials,
        page: u32,
        include_inactive: bool,
    ) -> Result<CouponPage, BackendError> {
        let mut url = self.endpoint("/api/coupons")?;
        url.query_pairs_mut()
            .append_pair("page", &page.max(1).to_string())
            .append_pair("includeInActiveCoupons", &include_inactive.to_string());
        let body = self
            .send_authorized(credentials, |http| Ok(http.get(url.clone())))
            .await?;
        Self::parse(&body, "coupon page")
    }

    /// Coupons the member can use on one product.
    ///
    /// # Errors
    ///
    /// Returns `NotLoggedIn` without credentials.
    #[instrument(skip(self, credentials), fields(product_id = %product_id))]
    pub async fn applicable_coupons(
        &self,
        credentials: &Credentials,
        product_id: ProductId,
    ) -> Result<Vec<ApplicableCoupon>, BackendError> {
        let url = self.endpoint(&format!("/api/coupons/{product_id}"))?;
        let body = self
            .send_authorized(credentials, |http| Ok(http.get(url.clone())))
            .await?;
        let coupons: ApplicableCoupons = Self::parse(&body, "applicable coupons")?;
        Ok(coupons.coupons)
    }

    /// Coupons offered to everyone.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn welcome_coupons(&self) -> Result<Vec<WelcomeCoupon>, BackendError> {
        let url = self.endpoint("/api/coupons/welcome")?;
        let body = self.send(self.http().get(url)).await?;
        let coupons: WelcomeCoupons = Self::parse(&body, "welcome coupons")?;
        Ok(coupons.coupons)
    }

    /// Issue a coupon to the member by its code.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` when the member already holds the coupon.
    #[instrument(skip(self, credentials))]
    pub async fn register_coupon(
        &self,
        credentials: &Credentials,
        code: &str,
    ) -> Result<(), BackendError> {
        let url = self.endpoint("/api/coupons")?;
        let code = code.trim().to_string();
        self.send_authorized(credentials, |http| {
            Ok(http
                .post(url.clone())
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(code.clone()))
        })
        .await?;
        Ok(())
    }

    /// The order a used coupon was spent on.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the backend does not answer with a numeric ID.
    #[instrument(skip(self, credentials), fields(coupon_id = %coupon_id))]
    pub async fn coupon_order(
        &self,
        credentials: &Credentials,
        coupon_id: CouponId,
    ) -> Result<OrderId, BackendError> {
        let url = self.endpoint(&format!("/api/coupons/{coupon_id}/order"))?;
        let body = self
            .send_authorized(credentials, |http| Ok(http.get(url.clone())))
            .await?;
        let raw = body.trim().trim_matches('"');
        raw.parse::<OrderId>().map_err(|_| {
            BackendError::Parse(serde::de::Error::custom(format!("not an order id: {raw}")))
        })
    }

    /// Members who downloaded a coupon (admin only), 1-based pages.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` with status 403 for non-admin tokens.
    #[instrument(skip(self, credentials), fields(coupon_id = %coupon_id))]
    pub async fn coupon_members(
        &self,
        credentials: &Credentials,
        coupon_id: CouponId,
        page: u32,
    ) -> Result<CouponMemberPage, BackendError> {
        let mut url = self.endpoint(&format!("/api/admin/coupons/{coupon_id}"))?;
        url.query_pairs_mut()
            .append_pair("page", &page.max(1).to_string());
        let body = self
            .send_authorized(credentials, |http| Ok(http.get(url.clone())))
            .await?;
        Self::parse(&body, "coupon members")
    }
}
