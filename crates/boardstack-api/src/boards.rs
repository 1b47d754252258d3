// Board resource: `/boards`.

use crate::client::ApiClient;
use crate::types::{Board, BoardCreateRequest, BoardUpdateRequest};
use crate::Error;

impl ApiClient {
    pub async fn list_boards(&self) -> Result<Vec<Board>, Error> {
        self.get("boards").await
    }

    /// Keyword search over title and content.
    pub async fn search_boards(&self, keyword: &str) -> Result<Vec<Board>, Error> {
        self.get_with_params("boards/search", &[("q", keyword.to_owned())])
            .await
    }

    pub async fn get_board(&self, id: i64) -> Result<Board, Error> {
        self.get(&format!("boards/{id}")).await
    }

    pub async fn create_board(&self, board: &BoardCreateRequest) -> Result<Board, Error> {
        self.post("boards", board).await
    }

    pub async fn update_board(&self, id: i64, board: &BoardUpdateRequest) -> Result<Board, Error> {
        self.put(&format!("boards/{id}"), board).await
    }

    pub async fn delete_board(&self, id: i64) -> Result<(), Error> {
        self.delete(&format!("boards/{id}")).await
    }
}
