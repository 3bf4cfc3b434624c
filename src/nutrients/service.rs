use bytes::Bytes;
use tracing::{debug, instrument};

use crate::client::ApiClient;
use crate::nutrients::dto::{
    DateRange, FoodType, FoodTypesPayload, FoodTypeSummary, Meal, MealQuery, MealsByTypePage,
    MealsPage, MealUpdate, ModelStatusPayload, NutritionSummary, PredictPayload,
    SaveMealRequest, SavedMealPayload,
};
use crate::response::{normalize, Ack, ApiOutcome};

/// One method per nutrient capability of the backend.
///
/// Like [`AuthService`](crate::auth::AuthService), every method resolves to
/// an [`ApiOutcome`] and never returns `Err`.
#[derive(Clone)]
pub struct NutrientService {
    client: ApiClient,
}

impl NutrientService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Run both prediction paths on a food image without saving anything.
    ///
    /// Uses the longer inference deadline. Either prediction slot of the
    /// payload may come back empty on its own; that is still a success.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn predict_only(&self, filename: &str, bytes: Bytes) -> ApiOutcome<PredictPayload> {
        let timeout = self.client.config().predict_timeout;
        normalize(
            self.client
                .post_multipart("/nutrients/predict-only", "image", filename, bytes, Some(timeout))
                .await,
            "Prediction failed",
        )
    }

    pub async fn save_meal(&self, request: &SaveMealRequest) -> ApiOutcome<SavedMealPayload> {
        normalize(
            self.client.post("/nutrients/save-meal", request).await,
            "Failed to save meal",
        )
    }

    pub async fn meals(&self, query: &MealQuery) -> ApiOutcome<MealsPage> {
        normalize(
            self.client.get_query("/nutrients/meals", query).await,
            "Failed to load meals",
        )
    }

    pub async fn meal_by_id(&self, meal_id: &str) -> ApiOutcome<Meal> {
        normalize(
            self.client
                .get(&format!("/nutrients/meals/{meal_id}"))
                .await,
            "Failed to load meal",
        )
    }

    pub async fn update_meal(&self, meal_id: &str, update: &MealUpdate) -> ApiOutcome<Ack> {
        debug!(meal_id, "updating meal");
        normalize(
            self.client
                .put(&format!("/nutrients/meals/{meal_id}"), update)
                .await,
            "Failed to update meal",
        )
    }

    pub async fn delete_meal(&self, meal_id: &str) -> ApiOutcome<Ack> {
        debug!(meal_id, "deleting meal");
        normalize(
            self.client
                .delete(&format!("/nutrients/meals/{meal_id}"))
                .await,
            "Failed to delete meal",
        )
    }

    pub async fn nutrition_summary(&self, range: &DateRange) -> ApiOutcome<NutritionSummary> {
        normalize(
            self.client
                .get_query("/nutrients/nutrition-summary", range)
                .await,
            "Failed to load nutrition summary",
        )
    }

    pub async fn meals_by_food_type(
        &self,
        food_type: FoodType,
        query: &MealQuery,
    ) -> ApiOutcome<MealsByTypePage> {
        normalize(
            self.client
                .get_query(&format!("/nutrients/meals/food-type/{food_type}"), query)
                .await,
            "Failed to load meals",
        )
    }

    pub async fn food_type_summary(&self, range: &DateRange) -> ApiOutcome<FoodTypeSummary> {
        normalize(
            self.client
                .get_query("/nutrients/food-type-summary", range)
                .await,
            "Failed to load food type summary",
        )
    }

    pub async fn valid_food_types(&self) -> ApiOutcome<FoodTypesPayload> {
        normalize(
            self.client.get("/nutrients/valid-food-types").await,
            "Failed to load food types",
        )
    }

    /// ML model health. This payload arrives at the envelope top level
    /// rather than under `data`.
    pub async fn model_status(&self) -> ApiOutcome<ModelStatusPayload> {
        normalize(
            self.client.get("/nutrients/model-status").await,
            "Failed to check model status",
        )
    }
}
